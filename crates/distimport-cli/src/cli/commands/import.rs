//! `distimport -p <path> -a <arch>` – the import run itself.

use anyhow::Result;
use distimport_core::arch::Arch;
use distimport_core::config::ImportConfig;
use distimport_core::runner::SystemRunner;
use distimport_core::source::IsoSource;
use distimport_core::workflow::{ImportRequest, Importer};

use crate::cli::Cli;

/// Build the request from the command line (arch first, as it is the cheapest check).
pub(crate) fn build_request(cli: &Cli) -> Result<ImportRequest> {
    let arch: Arch = cli.arch.parse()?;
    let source = IsoSource::parse(&cli.path)?;
    let mut req = ImportRequest::new(source, arch);
    req.nickname = cli.nickname.clone();
    req.sha256 = cli.sha256.clone();
    req.keep_iso = cli.keep_iso;
    Ok(req)
}

pub fn run_import(cfg: &ImportConfig, cli: &Cli) -> Result<()> {
    let req = build_request(cli)?;
    let report = Importer::new(cfg, &SystemRunner).run(&req)?;
    println!("Imported {} ({}) from {}", report.name, report.arch, req.source);
    if report.iso_kept {
        println!("ISO kept at {}", report.iso.display());
    }
    Ok(())
}
