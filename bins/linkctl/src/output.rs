//! Text and JSON rendering shared by the commands.

use std::io::{self, Write};
use std::net::IpAddr;

use linkstate::lldp::{NeighborRecord, capabilities_to_string};
use linkstate::util::format_prefix;
use linkstate::{AddressLabel, Gateway, LinkInfo, LocalAddress};
use serde_json::{Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub pretty: bool,
    /// Print table headers and footers.
    pub legend: bool,
    pub all: bool,
}

pub fn print_json<W: Write>(w: &mut W, value: &Value, opts: &OutputOptions) -> io::Result<()> {
    if opts.pretty {
        serde_json::to_writer_pretty(&mut *w, value)?;
    } else {
        serde_json::to_writer(&mut *w, value)?;
    }
    writeln!(w)
}

/// Print a labelled field; list values continue on aligned lines.
pub fn print_field<W, I, S>(w: &mut W, label: &str, values: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for (i, value) in values.into_iter().enumerate() {
        let label = if i == 0 { label } else { "" };
        let sep = if i == 0 { ':' } else { ' ' };
        writeln!(w, "{:>20}{} {}", label, sep, value.as_ref())?;
    }
    Ok(())
}

/// Name of `ifindex` among `links`, or the index itself.
pub fn link_name(links: &[LinkInfo], ifindex: u32) -> String {
    links
        .iter()
        .find(|link| link.index == ifindex)
        .map(|link| link.name.clone())
        .unwrap_or_else(|| ifindex.to_string())
}

pub fn link_json(link: &LinkInfo) -> Value {
    let mut obj = json!({
        "ifindex": link.index,
        "ifname": link.name,
        "type": link.iftype,
    });

    if let Some(mac) = &link.hw_addr {
        obj["address"] = json!(mac.to_string());
    }
    if let Some(mtu) = &link.mtu {
        obj["mtu"] = json!(mtu.value);
        if let Some(min) = mtu.min {
            obj["min_mtu"] = json!(min);
        }
        if let Some(max) = mtu.max {
            obj["max_mtu"] = json!(max);
        }
    }
    if let Some(tx) = link.tx_queues {
        obj["num_tx_queues"] = json!(tx);
    }
    if let Some(rx) = link.rx_queues {
        obj["num_rx_queues"] = json!(rx);
    }

    obj
}

pub fn address_json(addr: &LocalAddress) -> Value {
    json!({
        "ifindex": addr.ifindex,
        "address": addr.address.to_string(),
        "prefixlen": addr.prefix_len,
        "scope": addr.scope,
    })
}

pub fn gateway_json(gateway: &Gateway) -> Value {
    let mut obj = json!({
        "ifindex": gateway.ifindex,
        "gateway": gateway.address.to_string(),
    });

    if let Some(metric) = gateway.metric {
        obj["metric"] = json!(metric);
    }
    if let Some(mac) = &gateway.hw_addr {
        obj["lladdr"] = json!(mac.to_string());
    }
    if let Some(vendor) = &gateway.vendor {
        obj["vendor"] = json!(vendor);
    }

    obj
}

pub fn gateway_text(gateway: &Gateway, links: &[LinkInfo]) -> String {
    let mut text = format!(
        "{} on {}",
        gateway.address,
        link_name(links, gateway.ifindex)
    );
    if let Some(vendor) = &gateway.vendor {
        text.push_str(&format!(" ({})", vendor));
    }
    text
}

pub fn neighbor_json(record: &NeighborRecord) -> Value {
    let mut obj = json!({
        "neighbor": record.source.to_string(),
        "chassis_id": record.chassis_id,
        "port_id": record.port_id,
        "ttl": record.ttl,
    });

    if let Some(name) = &record.system_name {
        obj["system_name"] = json!(name);
    }
    if let Some(desc) = &record.system_description {
        obj["system_description"] = json!(desc);
    }
    if let Some(desc) = &record.port_description {
        obj["port_description"] = json!(desc);
    }
    if let Some(caps) = &record.capabilities {
        obj["system_capabilities"] = json!(capabilities_to_string(caps.system));
        obj["enabled_capabilities"] = json!(capabilities_to_string(caps.enabled));
    }

    obj
}

pub fn label_json(label: &AddressLabel) -> Value {
    json!({
        "prefix": format_prefix(&IpAddr::V6(label.prefix), label.prefix_len),
        "label": label.label,
    })
}
