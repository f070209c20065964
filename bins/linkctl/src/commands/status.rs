//! linkctl status command implementation.

use std::io::{self, Write};

use clap::Args;
use linkstate::lldp::NeighborData;
use linkstate::vendor::VendorDatabase;
use linkstate::{
    LinkFilter, LinkInfo, LinkStatus, Paths, SystemStatus, Transport, enumerate_links,
    link_status, system_status,
};
use serde_json::{Value, json};

use crate::output::{
    OutputFormat, OutputOptions, address_json, gateway_json, gateway_text, link_json, link_name,
    neighbor_json, print_field, print_json,
};

#[derive(Args)]
pub struct StatusCmd {
    /// Shell-style patterns matched against link names or indexes.
    ///
    /// Without patterns the system status is shown, unless --all is given.
    patterns: Vec<String>,
}

impl StatusCmd {
    pub fn run<T, V>(
        self,
        transport: &T,
        vendors: &V,
        paths: &Paths,
        format: OutputFormat,
        opts: &OutputOptions,
    ) -> anyhow::Result<()>
    where
        T: Transport,
        V: VendorDatabase,
    {
        let links = enumerate_links(transport, &LinkFilter::all())?;

        let stdout = io::stdout();
        let mut out = stdout.lock();

        if self.patterns.is_empty() && !opts.all {
            let status = system_status(transport, vendors, paths)?;
            return match format {
                OutputFormat::Json => Ok(print_json(&mut out, &system_json(&status), opts)?),
                OutputFormat::Text => Ok(print_system(&mut out, &status, &links)?),
            };
        }

        let filter = LinkFilter::new(&self.patterns)?;
        let selected: Vec<&LinkInfo> = links
            .iter()
            .filter(|link| filter.matches(link.index, &link.name))
            .collect();
        if selected.is_empty() {
            anyhow::bail!("no link matches {}", self.patterns.join(" "));
        }

        let mut items = Vec::new();
        for (i, link) in selected.into_iter().enumerate() {
            let status = link_status(transport, vendors, paths, link)?;
            match format {
                OutputFormat::Json => items.push(link_status_json(&status)),
                OutputFormat::Text => {
                    if i > 0 {
                        writeln!(out)?;
                    }
                    print_link(&mut out, &status, &links)?;
                }
            }
        }

        if format == OutputFormat::Json {
            print_json(&mut out, &json!(items), opts)?;
        }

        Ok(())
    }
}

fn system_json(status: &SystemStatus) -> Value {
    let mut obj = json!({
        "addresses": status.addresses.iter().map(address_json).collect::<Vec<_>>(),
        "gateways": status.gateways.iter().map(gateway_json).collect::<Vec<_>>(),
    });

    if let Some(state) = &status.state {
        obj["operational_state"] = json!(state.oper_state);
        obj["dns"] = json!(state.dns);
        obj["ntp"] = json!(state.ntp);
        obj["search_domains"] = json!(state.search_domains);
        obj["route_domains"] = json!(state.route_domains);
    }

    obj
}

fn print_system<W: Write>(w: &mut W, status: &SystemStatus, links: &[LinkInfo]) -> io::Result<()> {
    let state = status.state.as_ref();

    print_field(
        w,
        "State",
        [state
            .and_then(|s| s.oper_state.as_deref())
            .unwrap_or("n/a")],
    )?;
    print_field(
        w,
        "Address",
        status
            .addresses
            .iter()
            .map(|a| format!("{} on {}", a.address, link_name(links, a.ifindex))),
    )?;
    print_field(
        w,
        "Gateway",
        status.gateways.iter().map(|g| gateway_text(g, links)),
    )?;

    if let Some(state) = state {
        print_field(w, "DNS", &state.dns)?;
        print_field(w, "Search Domains", &state.search_domains)?;
        print_field(w, "Route Domains", &state.route_domains)?;
        print_field(w, "NTP", &state.ntp)?;
    }

    Ok(())
}

fn link_status_json(status: &LinkStatus) -> Value {
    let mut obj = link_json(&status.link);
    obj["kind"] = json!(status.type_string);
    obj["operational_state"] = json!(status.oper_state());
    obj["setup_state"] = json!(status.setup_state());
    obj["addresses"] = json!(status.addresses.iter().map(address_json).collect::<Vec<_>>());
    obj["gateways"] = json!(status.gateways.iter().map(gateway_json).collect::<Vec<_>>());

    if let Some(vendor) = &status.hw_vendor {
        obj["address_vendor"] = json!(vendor);
    }

    if let Some(state) = &status.state {
        obj["network_file"] = json!(state.network_file);
        obj["dns"] = json!(state.dns);
        obj["ntp"] = json!(state.ntp);
        obj["search_domains"] = json!(state.search_domains);
        obj["route_domains"] = json!(state.route_domains);
        obj["timezone"] = json!(state.timezone);
        obj["carrier_bound_to"] = json!(state.carrier_bound_to);
        obj["carrier_bound_by"] = json!(state.carrier_bound_by);
    }

    if let Some(device) = &status.device {
        obj["link_file"] = json!(device.link_file);
        obj["driver"] = json!(device.driver);
        obj["path"] = json!(device.path);
        obj["vendor"] = json!(device.vendor);
        obj["model"] = json!(device.model);
    }

    if let Ok(data) = &status.neighbors {
        obj["lldp"] = json!(data.records().iter().map(neighbor_json).collect::<Vec<_>>());
    }

    obj
}

fn print_link<W: Write>(w: &mut W, status: &LinkStatus, links: &[LinkInfo]) -> io::Result<()> {
    let link = &status.link;
    let state = status.state.as_ref();
    let device = status.device.as_ref();

    writeln!(w, "\u{25cf} {}: {}", link.index, link.name)?;

    if let Some(file) = device.and_then(|d| d.link_file.as_deref()) {
        print_field(w, "Link File", [file])?;
    }
    if let Some(file) = state.and_then(|s| s.network_file.as_deref()) {
        print_field(w, "Network File", [file])?;
    }
    print_field(w, "Type", [status.type_string.as_deref().unwrap_or("n/a")])?;
    print_field(
        w,
        "State",
        [format!(
            "{} ({})",
            status.oper_state().unwrap_or("n/a"),
            status.setup_state()
        )],
    )?;

    if let Some(device) = device {
        for (label, value) in [
            ("Path", &device.path),
            ("Driver", &device.driver),
            ("Vendor", &device.vendor),
            ("Model", &device.model),
        ] {
            if let Some(value) = value {
                print_field(w, label, [value])?;
            }
        }
    }

    if let Some(mac) = link.hw_addr.filter(|mac| !mac.is_zero()) {
        let text = match &status.hw_vendor {
            Some(vendor) => format!("{} ({})", mac, vendor),
            None => mac.to_string(),
        };
        print_field(w, "HW Address", [text])?;
    }

    if let Some(mtu) = &link.mtu {
        let mut text = mtu.value.to_string();
        match (mtu.min, mtu.max) {
            (Some(min), Some(max)) => text.push_str(&format!(" (min: {}, max: {})", min, max)),
            (Some(min), None) => text.push_str(&format!(" (min: {})", min)),
            (None, Some(max)) => text.push_str(&format!(" (max: {})", max)),
            (None, None) => {}
        }
        print_field(w, "MTU", [text])?;
    }

    if link.tx_queues.is_some() || link.rx_queues.is_some() {
        let count = |n: Option<u32>| n.map_or_else(|| "n/a".to_string(), |n| n.to_string());
        print_field(
            w,
            "Queue Length (Tx/Rx)",
            [format!("{}/{}", count(link.tx_queues), count(link.rx_queues))],
        )?;
    }

    print_field(w, "Address", status.addresses.iter().map(|a| a.address.to_string()))?;
    print_field(
        w,
        "Gateway",
        status.gateways.iter().map(|g| gateway_text(g, links)),
    )?;

    if let Some(state) = state {
        print_field(w, "DNS", &state.dns)?;
        print_field(w, "Search Domains", &state.search_domains)?;
        print_field(w, "Route Domains", &state.route_domains)?;
        print_field(w, "NTP", &state.ntp)?;
        if let Some(tz) = &state.timezone {
            print_field(w, "Time Zone", [tz])?;
        }
        print_field(
            w,
            "Carrier Bound To",
            state.carrier_bound_to.iter().map(|&i| link_name(links, i)),
        )?;
        print_field(
            w,
            "Carrier Bound By",
            state.carrier_bound_by.iter().map(|&i| link_name(links, i)),
        )?;
    }

    match &status.neighbors {
        Ok(NeighborData::NoData) => {}
        Ok(data) => {
            print_field(w, "Connected To", data.records().iter().map(|r| r.to_string()))?;
        }
        Err(e) => {
            print_field(w, "Connected To", [format!("n/a ({})", e)])?;
        }
    }

    Ok(())
}
