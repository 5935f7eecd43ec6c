//! Command-line front-end for the module-cache index: enough to build,
//! incrementally update, and query an index from a shell, for manual
//! exercising and smoke-testing of the library. Ranking, UI concerns, and
//! everything else upstream of the index remain the editor service's job.

use clap::{crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use modcache_index::cancel::Cancel;
use modcache_index::extract::Platform;
use modcache_index::lookup::{self, BuildMode, Handle};
use modcache_index::types::CacheDir;
use modcache_index::{config, log};
use slog::Logger;
use std::path::PathBuf;
use std::process::exit;

fn cli() -> App<'static, 'static> {
    App::new("mcindex")
        .about("Builds and queries the module-cache unimported-symbol index")
        .version(crate_version!())
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("index-dir")
                .long("index-dir")
                .value_name("DIR")
                .global(true)
                .help("Overrides the index directory (default: a platform-specific user cache dir)"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .global(true)
                .help("Logs build diagnostics to stderr instead of discarding them"),
        )
        .subcommand(
            SubCommand::with_name("build")
                .about("Builds a fresh index from scratch")
                .arg(Arg::with_name("cache-dir").required(true).index(1)),
        )
        .subcommand(
            SubCommand::with_name("update")
                .about("Incrementally updates the index, reusing the prior build when possible")
                .arg(Arg::with_name("cache-dir").required(true).index(1)),
        )
        .subcommand(
            SubCommand::with_name("lookup")
                .about("Looks up exported symbols with a given prefix in one package")
                .arg(Arg::with_name("package").required(true).index(1))
                .arg(Arg::with_name("prefix").required(true).index(2))
                .arg(
                    Arg::with_name("exact")
                        .long("exact")
                        .help("Matches the prefix exactly rather than as a prefix"),
                ),
        )
        .subcommand(
            SubCommand::with_name("lookup-all")
                .about("Finds entries of one package whose exports cover every given name")
                .arg(Arg::with_name("package").required(true).index(1))
                .arg(Arg::with_name("names").required(true).multiple(true).index(2)),
        )
}

fn index_dir(args: &ArgMatches) -> PathBuf {
    args.value_of("index-dir")
        .map(PathBuf::from)
        .unwrap_or_else(config::index_dir)
}

fn logger(args: &ArgMatches) -> Logger {
    if args.is_present("verbose") {
        log::term_logger()
    } else {
        log::discard()
    }
}

fn run() -> Result<(), String> {
    let matches = cli().get_matches();
    let logger = logger(&matches);
    let ixdir = index_dir(&matches);
    let cancel = Cancel::new();

    match matches.subcommand() {
        ("build", Some(sub)) => {
            let cache_dir = CacheDir(PathBuf::from(sub.value_of("cache-dir").unwrap()));
            let path = lookup::build(&ixdir, &cache_dir, BuildMode::Full, Platform::default(), &cancel, &logger)
                .map_err(|e| e.to_string())?;
            println!("wrote {}", path.display());
        }
        ("update", Some(sub)) => {
            let cache_dir = CacheDir(PathBuf::from(sub.value_of("cache-dir").unwrap()));
            let path = lookup::build(&ixdir, &cache_dir, BuildMode::Incremental, Platform::default(), &cancel, &logger)
                .map_err(|e| e.to_string())?;
            println!("wrote {}", path.display());
        }
        ("lookup", Some(sub)) => {
            let handle = Handle::open_at(&ixdir, &logger).map_err(|e| e.to_string())?;
            let pkg = sub.value_of("package").unwrap();
            let prefix = sub.value_of("prefix").unwrap();
            let exact = sub.is_present("exact");
            for sym in handle.lookup(pkg, prefix, exact) {
                match &sym {
                    modcache_index::Symbol::Func { params, result_count, .. } => {
                        let rendered: Vec<String> = params.iter().map(|p| format!("{} {}", p.name, p.ty)).collect();
                        println!("func {}({}) -> {} result(s)", sym.name(), rendered.join(", "), result_count.0);
                    }
                    _ => println!("{:?} {}", sym.kind(), sym.name()),
                }
            }
        }
        ("lookup-all", Some(sub)) => {
            let handle = Handle::open_at(&ixdir, &logger).map_err(|e| e.to_string())?;
            let pkg = sub.value_of("package").unwrap();
            let names: Vec<&str> = sub.values_of("names").unwrap().collect();
            for entry in handle.lookup_all(pkg, &names) {
                println!("{} ({}, {})", entry.import_path, entry.rel_dir, entry.version);
            }
        }
        _ => unreachable!("clap requires a subcommand per AppSettings::SubcommandRequiredElseHelp"),
    }

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {}", e);
        exit(1);
    }
}
