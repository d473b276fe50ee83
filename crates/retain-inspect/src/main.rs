//! retain-inspect: analyzer-side view of heap dump hand-off files.
//!
//! Commands:
//! - `retain-inspect show --handoff <path>` - print the descriptor
//! - `retain-inspect check --handoff <path>` - verify the snapshot it points at is readable

use std::fmt::{self, Write};
use std::path::Path;

use facet::Facet;
use figue as args;
use retain::{ExclusionTarget, HeapDump, read_handoff};
use tracing::{info, warn};

#[derive(Facet, Debug)]
struct InspectCli {
    #[facet(flatten)]
    builtins: args::FigueBuiltins,
    #[facet(args::subcommand)]
    command: InspectCommand,
}

#[derive(Facet, Debug)]
#[repr(u8)]
enum InspectCommand {
    Show {
        #[facet(args::named)]
        handoff: String,
    },
    Check {
        #[facet(args::named)]
        handoff: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let cli = parse_cli()?;
    match cli.command {
        InspectCommand::Show { handoff } => run_show(Path::new(&handoff)),
        InspectCommand::Check { handoff } => run_check(Path::new(&handoff)),
    }
}

fn parse_cli() -> Result<InspectCli, String> {
    let figue_config = args::builder::<InspectCli>()
        .map_err(|e| format!("failed to build CLI schema: {e}"))?
        .cli(|cli| cli.strict())
        .help(|h| {
            h.program_name("retain-inspect")
                .description("Read and check heap dump hand-off files")
                .version(option_env!("CARGO_PKG_VERSION").unwrap_or("dev"))
        })
        .build();
    let cli = args::Driver::new(figue_config)
        .run()
        .into_result()
        .map_err(|e| e.to_string())?;
    Ok(cli.value)
}

fn load(handoff: &Path) -> Result<HeapDump, String> {
    read_handoff(handoff).map_err(|e| format!("{}: {e}", handoff.display()))
}

fn run_show(handoff: &Path) -> Result<(), String> {
    let heap_dump = load(handoff)?;
    let text = render(&heap_dump).map_err(|e| format!("render {}: {e}", handoff.display()))?;
    print!("{text}");
    Ok(())
}

fn run_check(handoff: &Path) -> Result<(), String> {
    let heap_dump = load(handoff)?;
    let file = heap_dump.heap_dump_file();
    let metadata = std::fs::metadata(file).map_err(|e| {
        warn!(key = %heap_dump.reference_key(), file = %file.display(), "snapshot missing");
        format!("snapshot {}: {e}", file.display())
    })?;
    if !metadata.is_file() {
        return Err(format!("snapshot {} is not a regular file", file.display()));
    }
    std::fs::File::open(file).map_err(|e| format!("snapshot {} is not readable: {e}", file.display()))?;

    info!(
        key = %heap_dump.reference_key(),
        file = %file.display(),
        bytes = metadata.len(),
        "snapshot ready for analysis"
    );
    println!("ok {} ({} bytes)", file.display(), metadata.len());
    Ok(())
}

fn render(heap_dump: &HeapDump) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "heap_dump_file:             {}", heap_dump.heap_dump_file().display())?;
    writeln!(out, "reference_key:              {}", heap_dump.reference_key())?;
    writeln!(out, "reference_name:             {}", heap_dump.reference_name())?;
    writeln!(out, "compute_retained_heap_size: {}", heap_dump.compute_retained_heap_size())?;
    writeln!(out, "watch_duration_ms:          {}", heap_dump.watch_duration_ms())?;
    writeln!(out, "gc_duration_ms:             {}", heap_dump.gc_duration_ms())?;
    writeln!(out, "heap_dump_duration_ms:      {}", heap_dump.heap_dump_duration_ms())?;
    writeln!(out, "excluded_refs:              {}", heap_dump.excluded_refs().len())?;
    for exclusion in heap_dump.excluded_refs() {
        let always = if exclusion.always_exclude { " (always)" } else { "" };
        writeln!(
            out,
            "  - {}{always}: {}",
            describe_target(&exclusion.target),
            exclusion.reason
        )?;
    }
    Ok(out)
}

fn describe_target(target: &ExclusionTarget) -> String {
    match target {
        ExclusionTarget::InstanceField { class_name, field_name } => format!("field {class_name}#{field_name}"),
        ExclusionTarget::StaticField { class_name, field_name } => {
            format!("static field {class_name}#{field_name}")
        }
        ExclusionTarget::Thread { thread_name } => format!("thread {thread_name}"),
        ExclusionTarget::Class { class_name } => format!("class {class_name}"),
    }
}
