//! linkctl list command implementation.

use std::io::{self, Write};

use clap::Args;
use linkstate::{LinkFilter, Paths, Transport, enumerate_links, link_summaries};
use serde_json::json;

use crate::output::{OutputFormat, OutputOptions, link_json, print_json};

#[derive(Args, Default)]
pub struct ListCmd {
    /// Shell-style patterns matched against link names or indexes.
    patterns: Vec<String>,
}

impl ListCmd {
    pub fn run<T: Transport>(
        self,
        transport: &T,
        paths: &Paths,
        format: OutputFormat,
        opts: &OutputOptions,
    ) -> anyhow::Result<()> {
        let filter = LinkFilter::new(&self.patterns)?;
        let links = enumerate_links(transport, &filter)?;
        let summaries = link_summaries(paths, &links);

        let stdout = io::stdout();
        let mut out = stdout.lock();

        match format {
            OutputFormat::Json => {
                let items: Vec<_> = summaries
                    .iter()
                    .map(|s| {
                        let mut obj = link_json(&s.link);
                        obj["kind"] = json!(s.type_string);
                        obj["operational_state"] = json!(s.oper_state);
                        obj["setup_state"] = json!(s.setup_state);
                        obj
                    })
                    .collect();
                print_json(&mut out, &json!(items), opts)?;
            }
            OutputFormat::Text => {
                if opts.legend {
                    writeln!(
                        out,
                        "{:>3} {:<16} {:<10} {:<12} {}",
                        "IDX", "LINK", "TYPE", "OPERATIONAL", "SETUP"
                    )?;
                }
                for s in &summaries {
                    writeln!(
                        out,
                        "{:>3} {:<16} {:<10} {:<12} {}",
                        s.link.index,
                        s.link.name,
                        s.type_string.as_deref().unwrap_or("n/a"),
                        s.oper_state.as_deref().unwrap_or("n/a"),
                        s.setup_state
                    )?;
                }
                if opts.legend {
                    writeln!(out, "\n{} links listed.", summaries.len())?;
                }
            }
        }

        Ok(())
    }
}
