// vim: tw=80
use std::{
    io::{self, Write},
    num::NonZeroU64,
    path::{Path, PathBuf},
};

use clap::{crate_version, Parser};
use divbuf::DivBufShared;
use futures::TryStreamExt;
use po2zone_core::{
    device_manager::DevManager,
    mapped_device::MappedDevice,
    registry::Registry,
    target::{self, Po2Target, StatusType},
    vdev::Vdev,
    Error,
    Result,
    SectorT,
    BYTES_PER_SECTOR,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Largest read that the `read` subcommand will perform, in sectors
const MAX_READ: SectorT = 1 << 16;

/// Attach the emulation layer to the file at `path`, covering all of it.
async fn attach(devices: &DevManager, path: &Path, zone_size: SectorT)
    -> Result<MappedDevice>
{
    let zone_sectors = NonZeroU64::new(zone_size).ok_or(Error::EINVAL)?;
    let name = devices.taste(path, zone_sectors).await?;
    let len = {
        let dev = devices.open(&name)?;
        let size = dev.size();
        devices.put(dev);
        size
    };
    let target = Po2Target::construct(devices, &[name.as_str()], 0, len)?;
    debug!("attached {name} as a {} sector device", target.len());
    Ok(MappedDevice::new(target))
}

#[derive(Parser, Clone, Debug)]
/// Show the emulated geometry of a device
struct Info {
    /// Backing file
    #[clap(required(true))]
    device: PathBuf,
}

impl Info {
    async fn main(self, zone_size: SectorT) -> Result<()> {
        let mut registry = Registry::new();
        target::register(&mut registry)?;
        let devices = DevManager::new();
        let md = attach(&devices, &self.device, zone_size).await?;
        let tgt = md.target();
        let g = tgt.geometry();
        if let Some(tt) = registry.get(target::TARGET_TYPE.name) {
            println!("Target:              {tt}");
        }
        println!("Device:              {}", tgt.status(StatusType::Table));
        println!("Zones:               {}", g.zone_count());
        println!("Real zone size:      {}", g.real_zone_size());
        println!("Emulated zone size:  {}", g.virtual_zone_size());
        println!("Padding per zone:    {}", g.padding_len());
        println!("Physical length:     {}", g.physical_length());
        println!("Emulated length:     {}", tgt.len());
        if let Some(w) = g.warning() {
            println!("Warning:             {w}");
        }
        md.into_target().destruct(&devices);
        Ok(())
    }
}

#[derive(Parser, Clone, Debug)]
/// Dump sectors from the emulated device
struct Read {
    /// Backing file
    #[clap(required(true))]
    device: PathBuf,
    /// First emulated sector to read
    #[clap(required(true))]
    sector: SectorT,
    /// Number of sectors to read
    #[clap(
        required(true),
        value_parser = clap::value_parser!(u64).range(1..=MAX_READ)
    )]
    count:  SectorT,
}

impl Read {
    async fn main(self, zone_size: SectorT) -> Result<()> {
        let devices = DevManager::new();
        let md = attach(&devices, &self.device, zone_size).await?;
        let dbs = DivBufShared::from(
            vec![0u8; self.count as usize * BYTES_PER_SECTOR]
        );
        md.read_at(dbs.try_mut().unwrap(), self.sector).await?;
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        for line in hexdump::hexdump_iter(&dbs.try_const().unwrap()) {
            writeln!(lock, "{line}").map_err(Error::from)?;
        }
        md.into_target().destruct(&devices);
        Ok(())
    }
}

#[derive(Parser, Clone, Debug)]
/// List the emulated device's zones
struct ReportZones {
    /// Print tab-separated output, without a header
    #[clap(short = 'H', long)]
    parseable: bool,
    /// Maximum number of zones to report
    #[clap(short = 'n', long, default_value = "4294967295")]
    count:     u32,
    /// Report zones beginning with the one containing this emulated sector
    #[clap(short, long, default_value = "0")]
    start:     SectorT,
    /// Backing file
    #[clap(required(true))]
    device:    PathBuf,
}

impl ReportZones {
    async fn main(self, zone_size: SectorT) -> Result<()> {
        let devices = DevManager::new();
        let md = attach(&devices, &self.device, zone_size).await?;
        let zones = md.report_zones(self.start, self.count)
            .try_collect::<Vec<_>>()
            .await?;
        if self.parseable {
            for (idx, z) in zones {
                println!("{}\t{}\t{}\t{}\t{}\t{}\t{}", idx, z.start, z.len,
                    z.capacity, z.wp, z.zone_type, z.cond);
            }
        } else {
            let mut table = tabular::Table::new(
                "{:>} {:>} {:>} {:>} {:>} {:<} {:<}"
            );
            table.add_row(tabular::row!("IDX", "START", "LEN", "CAP", "WP",
                "TYPE", "COND"));
            for (idx, z) in zones {
                table.add_row(tabular::row!(idx, z.start, z.len, z.capacity,
                    z.wp, z.zone_type, z.cond));
            }
            print!("{table}");
        }
        md.into_target().destruct(&devices);
        Ok(())
    }
}

#[derive(Parser, Clone, Debug)]
enum SubCommand {
    Info(Info),
    Read(Read),
    ReportZones(ReportZones),
}

#[derive(Parser, Clone, Debug)]
#[clap(version = crate_version!())]
/// Inspect a zoned device through power-of-two zone emulation
struct Cli {
    /// Zone size of the backing device, in 512-byte sectors
    #[clap(
        short,
        long,
        required(true),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    zone_size: SectorT,
    #[clap(subcommand)]
    cmd:       SubCommand,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let cli: Cli = Cli::parse();
    match cli.cmd {
        SubCommand::Info(info) => info.main(cli.zone_size).await,
        SubCommand::Read(read) => read.main(cli.zone_size).await,
        SubCommand::ReportZones(rz) => rz.main(cli.zone_size).await,
    }
}
