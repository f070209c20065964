//! linkctl labels command implementation.

use std::io::{self, Write};
use std::net::IpAddr;

use clap::Args;
use linkstate::util::format_prefix;
use linkstate::{Transport, address_labels};
use serde_json::json;

use crate::output::{OutputFormat, OutputOptions, label_json, print_json};

#[derive(Args)]
pub struct LabelCmd {}

impl LabelCmd {
    pub fn run<T: Transport>(
        self,
        transport: &T,
        format: OutputFormat,
        opts: &OutputOptions,
    ) -> anyhow::Result<()> {
        let labels = address_labels(transport)?;

        let stdout = io::stdout();
        let mut out = stdout.lock();

        match format {
            OutputFormat::Json => {
                let items: Vec<_> = labels.iter().map(label_json).collect();
                print_json(&mut out, &json!(items), opts)?;
            }
            OutputFormat::Text => {
                if opts.legend {
                    writeln!(out, "{:>45} {:>8}", "Prefix/Prefixlen", "Label")?;
                }
                for label in &labels {
                    let prefix = format_prefix(&IpAddr::V6(label.prefix), label.prefix_len);
                    writeln!(out, "{:>45} {:>8}", prefix, label.label)?;
                }
            }
        }

        Ok(())
    }
}
