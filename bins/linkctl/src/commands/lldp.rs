//! linkctl lldp command implementation.

use std::io::{self, Write};

use clap::Args;
use linkstate::lldp::{Capability, NeighborData, capabilities_to_string, neighbors_for_links};
use linkstate::{LinkFilter, Paths, Transport, enumerate_links};
use serde_json::json;

use crate::output::{OutputFormat, OutputOptions, neighbor_json, print_json};

#[derive(Args)]
pub struct LldpCmd {
    /// Shell-style patterns matched against link names or indexes.
    patterns: Vec<String>,
}

impl LldpCmd {
    pub fn run<T: Transport>(
        self,
        transport: &T,
        paths: &Paths,
        format: OutputFormat,
        opts: &OutputOptions,
    ) -> anyhow::Result<()> {
        let filter = LinkFilter::new(&self.patterns)?;
        let links = enumerate_links(transport, &filter)?;
        let neighbors = neighbors_for_links(paths, &links);

        let stdout = io::stdout();
        let mut out = stdout.lock();

        match format {
            OutputFormat::Json => {
                let items: Vec<_> = neighbors
                    .iter()
                    .filter_map(|n| {
                        let data = n.data.as_ref().ok()?;
                        if matches!(data, NeighborData::NoData) {
                            return None;
                        }
                        let mut obj = json!({
                            "ifindex": n.ifindex,
                            "ifname": n.name,
                            "neighbors": data.records().iter().map(neighbor_json).collect::<Vec<_>>(),
                        });
                        if let Some(error) = data.error() {
                            obj["error"] = json!(error.to_string());
                        }
                        Some(obj)
                    })
                    .collect();
                print_json(&mut out, &json!(items), opts)?;
            }
            OutputFormat::Text => {
                if opts.legend {
                    writeln!(
                        out,
                        "{:<16} {:<17} {:<16} {:<11} {:<16} {}",
                        "LINK", "CHASSIS ID", "SYSTEM NAME", "CAPS", "PORT ID", "PORT DESCRIPTION"
                    )?;
                }

                let mut count = 0;
                let mut seen = 0;
                for n in &neighbors {
                    let Ok(data) = &n.data else {
                        continue;
                    };
                    for record in data.records() {
                        let caps = record
                            .enabled_capabilities()
                            .map(capabilities_to_string)
                            .unwrap_or_else(|| "n/a".to_string());
                        writeln!(
                            out,
                            "{:<16} {:<17} {:<16} {:<11} {:<16} {}",
                            n.name,
                            record.chassis_id.as_deref().unwrap_or("n/a"),
                            record.system_name.as_deref().unwrap_or("n/a"),
                            caps,
                            record.port_id.as_deref().unwrap_or("n/a"),
                            record.port_description.as_deref().unwrap_or("n/a"),
                        )?;
                        count += 1;
                        seen |= record.enabled_capabilities().unwrap_or(0);
                    }
                }

                if opts.legend {
                    let flags: Vec<_> = Capability::from_mask(seen)
                        .into_iter()
                        .map(|c| format!("{} - {}", c.letter(), c.description()))
                        .collect();
                    if !flags.is_empty() {
                        writeln!(out, "\nCapability Flags:\n{}", flags.join("; "))?;
                    }
                    writeln!(out, "\n{} neighbors listed.", count)?;
                }
            }
        }

        Ok(())
    }
}
