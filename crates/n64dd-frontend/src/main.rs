mod host;

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use n64dd_core::dd::mmio::REGS_BASE;
use n64dd_core::dd::regs::DdRegister;
use n64dd_core::disk;
use n64dd_core::trace::{Access, LogTracer, TraceLog};
use n64dd_core::{DdBus, DdController};

const USAGE: &str = "Usage: n64dd <disk_image> [--ipl <path>] [--track N] [--head N] \
                     [--blocks N] [--rtc] [--write-test] [--save]";

#[derive(Debug, Clone, PartialEq)]
struct Options {
    disk_path: PathBuf,
    ipl_path: Option<PathBuf>,
    track: u32,
    head: u32,
    blocks: u32,
    rtc: bool,
    write_test: bool,
    save: bool,
}

/// Accepts decimal or 0x-prefixed hex.
fn parse_u32(s: &str) -> Option<u32> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

fn parse_number(name: &str, v: &str) -> Result<u32, String> {
    parse_u32(v).ok_or_else(|| format!("{}: not a number: {}", name, v))
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut disk_path = None;
    let mut opts = Options {
        disk_path: PathBuf::new(),
        ipl_path: None,
        track: 0,
        head: 0,
        blocks: 1,
        rtc: false,
        write_test: false,
        save: false,
    };

    let mut it = args.iter().skip(1);
    while let Some(arg) = it.next() {
        let mut value = |name: &str| {
            it.next()
                .cloned()
                .ok_or_else(|| format!("{} needs a value", name))
        };
        match arg.as_str() {
            "--ipl" => opts.ipl_path = Some(PathBuf::from(value("--ipl")?)),
            "--track" => opts.track = parse_number("--track", &value("--track")?)?,
            "--head" => opts.head = parse_number("--head", &value("--head")?)?,
            "--blocks" => opts.blocks = parse_number("--blocks", &value("--blocks")?)?,
            "--rtc" => opts.rtc = true,
            "--write-test" => opts.write_test = true,
            "--save" => opts.save = true,
            a if a.starts_with("--") => return Err(format!("unknown option {}", a)),
            a => disk_path = Some(PathBuf::from(a)),
        }
    }

    opts.disk_path = disk_path.ok_or_else(|| USAGE.to_string())?;
    if opts.head > 1 {
        return Err(format!("--head must be 0 or 1 (got {})", opts.head));
    }
    Ok(opts)
}

fn hex_dump(data: &[u8], base: usize, rows: usize) {
    for (i, row) in data.chunks(16).take(rows).enumerate() {
        let bytes: Vec<String> = row.iter().map(|b| format!("{:02X}", b)).collect();
        eprintln!("  {:08X}: {}", base + i * 16, bytes.join(" "));
    }
}

fn print_status(bus: &mut DdBus) {
    let id = bus.read_u32(REGS_BASE + DdRegister::IdReg.offset());
    let status = bus.dd.reg(DdRegister::CmdStatus);
    eprintln!(
        "DD: ID {:#010X} ({} IPL), status {:#010X} [{}]",
        id,
        if bus.dd.has_ipl_rom() { "with" } else { "no" },
        status,
        host::status_flags(status).join(" ")
    );
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let opts = parse_args(&args).unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });

    let ipl = match opts.ipl_path.as_deref().map(disk::load_ipl).transpose() {
        Ok(ipl) => ipl,
        Err(e) => {
            eprintln!("Failed to load IPL ROM: {}", e);
            std::process::exit(1);
        }
    };
    let image = match disk::load_disk(&opts.disk_path) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Failed to load disk image: {}", e);
            std::process::exit(1);
        }
    };

    let mut dd = DdController::new(ipl, image);
    let trace_tail = std::env::var("N64DD_TRACE_TAIL")
        .ok()
        .and_then(|s| s.parse::<usize>().ok());
    let trace_log = trace_tail.map(|n| Rc::new(RefCell::new(TraceLog::new(n))));
    if std::env::var("N64DD_TRACE").is_ok_and(|v| v == "1") {
        dd = dd.with_tracer(LogTracer);
    } else if let Some(log) = &trace_log {
        dd = dd.with_tracer(Rc::clone(log));
    }
    let mut bus = DdBus::new(dd);

    print_status(&mut bus);

    if opts.rtc {
        eprintln!("RTC: {}", host::read_rtc(&mut bus));
    }

    match host::read_blocks(&mut bus, opts.track, opts.head, opts.blocks) {
        Ok(data) => {
            let size = host::sector_size(opts.track, opts.head);
            eprintln!(
                "Read track {:#X} head {}: {} block(s), {} bytes/sector, {} bytes",
                opts.track,
                opts.head,
                opts.blocks,
                size,
                data.len()
            );
            hex_dump(&data, 0, 8);
        }
        Err(e) => eprintln!("Read failed: {}", e),
    }

    if opts.write_test {
        let size = host::sector_size(opts.track, opts.head);
        let len = size * 85 * opts.blocks as usize;
        let pattern: Vec<u8> = (0..len).map(|i| (i as u8) ^ (i >> 8) as u8 ^ 0xA5).collect();
        let verified = host::write_blocks(&mut bus, opts.track, opts.head, &pattern)
            .and_then(|()| host::read_blocks(&mut bus, opts.track, opts.head, opts.blocks));
        match verified {
            Ok(back) if back == pattern => eprintln!("Write test: OK ({} bytes)", len),
            Ok(back) => {
                let first = back.iter().zip(&pattern).position(|(a, b)| a != b);
                eprintln!("Write test: MISMATCH (first difference at {:?})", first);
                std::process::exit(1);
            }
            Err(e) => {
                eprintln!("Write test failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    print_status(&mut bus);

    if opts.save {
        if bus.dd.is_dirty() {
            if let Err(e) = disk::save_disk(&opts.disk_path, bus.dd.disk_data()) {
                eprintln!("Failed to save disk image: {}", e);
                std::process::exit(1);
            }
        } else {
            eprintln!("Disk image unchanged, not saving");
        }
    }

    if let (Some(log), Some(n)) = (&trace_log, trace_tail) {
        let log = log.borrow();
        eprintln!("Last {} of {} register accesses:", n.min(log.len()), log.len());
        for entry in log.iter_recent(n) {
            match entry.access {
                Access::Read => eprintln!("  R {:<20} {:#010X}", entry.name, entry.word),
                Access::Write { mask } => eprintln!(
                    "  W {:<20} {:#010X} (mask {:#010X})",
                    entry.name, entry.word, mask
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("n64dd")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn defaults_with_only_a_disk() {
        let opts = parse_args(&args(&["game.ndd"])).unwrap();
        assert_eq!(opts.disk_path, PathBuf::from("game.ndd"));
        assert_eq!(opts.ipl_path, None);
        assert_eq!((opts.track, opts.head, opts.blocks), (0, 0, 1));
        assert!(!opts.rtc && !opts.write_test && !opts.save);
    }

    #[test]
    fn value_flags_do_not_become_the_disk_path() {
        let opts = parse_args(&args(&[
            "--ipl", "ipl.n64", "--track", "0x2FB", "--head", "1", "game.ndd", "--blocks", "2",
            "--rtc", "--save",
        ]))
        .unwrap();
        assert_eq!(opts.disk_path, PathBuf::from("game.ndd"));
        assert_eq!(opts.ipl_path, Some(PathBuf::from("ipl.n64")));
        assert_eq!((opts.track, opts.head, opts.blocks), (0x2FB, 1, 2));
        assert!(opts.rtc && opts.save && !opts.write_test);
    }

    #[test]
    fn bad_arguments_are_reported() {
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["d.ndd", "--track"])).is_err());
        assert!(parse_args(&args(&["d.ndd", "--track", "x"])).is_err());
        assert!(parse_args(&args(&["d.ndd", "--head", "2"])).is_err());
        assert!(parse_args(&args(&["d.ndd", "--bogus"])).is_err());
    }
}
