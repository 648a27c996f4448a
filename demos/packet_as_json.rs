//! Dumps a hex encoded captured frame as Json.
//!
//! ```text
//! cargo run --example packet_json -- 45000020000040004011b6e4c0a80001c0a8000204d2003500080000 --encap 101
//! ```

use clap::Parser;

use incision::{EncapType, Packet, ENCAP_TYPE_ETH};

#[derive(Parser, Debug)]
struct Cli {
    /// Link type of the capture (1 Ethernet, 0 BSD loopback, 101 raw IP).
    #[arg(long, default_value_t = ENCAP_TYPE_ETH)]
    encap: EncapType,

    /// Only list the decoded layers.
    #[arg(long)]
    layers: bool,

    /// The frame, hex encoded.
    packet: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    incision::register_defaults();

    let bytes = hex::decode(cli.packet.trim())?;
    let p = Packet::from_bytes(&bytes, cli.encap)?;

    if cli.layers {
        for layer in p.layers() {
            println!("{} ({})", layer.name(), layer.short_name());
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&p)?);
    }

    Ok(())
}
