//! Plugin Accessors Generator CLI

use std::path::{Path, PathBuf};
use std::process;

use accessorc::{
    build_plugin_accessors_for, init_tracing, plugin_accessors_of, plugin_entries_from_dirs,
    read_catalogue_file, AccessorsCache, Fingerprint, GenerateConfig,
};
use accessors_ir::{PluginAccessor, PluginEntry, PluginTree};

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    match args[1].as_str() {
        "generate" => {
            let options = match GenerateOptions::parse(&args[2..]) {
                Ok(options) => options,
                Err(message) => {
                    eprintln!("error: {message}");
                    eprintln!();
                    print_generate_usage();
                    process::exit(1);
                }
            };
            run_generate(&options);
        }
        "tree" => {
            if args.len() < 3 {
                eprintln!("Usage: accessorc tree <catalogue>");
                process::exit(1);
            }
            run_tree(Path::new(&args[2]));
        }
        "help" | "--help" | "-h" => print_usage(),
        "version" | "--version" | "-V" => {
            println!("accessorc {}", accessorc::GENERATOR_VERSION);
        }
        other => {
            eprintln!("error: unknown command '{other}'");
            eprintln!();
            print_usage();
            process::exit(1);
        }
    }
}

enum Catalogue {
    File(PathBuf),
    Classpath(Vec<PathBuf>),
}

struct GenerateOptions {
    catalogue: Catalogue,
    src: Option<PathBuf>,
    bin: Option<PathBuf>,
    cache: Option<PathBuf>,
    config: GenerateConfig,
}

impl GenerateOptions {
    fn parse(args: &[String]) -> Result<Self, String> {
        let mut catalogue_file = None;
        let mut classpath = Vec::new();
        let mut src = None;
        let mut bin = None;
        let mut cache = None;
        let mut config = GenerateConfig::default();

        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();
            let Some(value) = args.get(i + 1) else {
                return Err(format!("missing value for '{flag}'"));
            };
            match flag {
                "--catalogue" => catalogue_file = Some(PathBuf::from(value)),
                "--classpath" => classpath.push(PathBuf::from(value)),
                "--src" => src = Some(PathBuf::from(value)),
                "--bin" => bin = Some(PathBuf::from(value)),
                "--cache" => cache = Some(PathBuf::from(value)),
                "--module" => config = config.with_module_name(value.as_str()),
                "--jobs" | "-j" => config = config.with_jobs(parse_count(flag, value)?),
                "--queue" => config = config.with_write_queue_capacity(parse_count(flag, value)?),
                _ => return Err(format!("unknown option '{flag}'")),
            }
            i += 2;
        }

        let catalogue = match (catalogue_file, classpath.is_empty()) {
            (Some(file), true) => Catalogue::File(file),
            (None, false) => Catalogue::Classpath(classpath),
            (Some(_), false) => {
                return Err("--catalogue and --classpath are mutually exclusive".to_owned())
            }
            (None, true) => return Err("one of --catalogue or --classpath is required".to_owned()),
        };
        if cache.is_none() && (src.is_none() || bin.is_none()) {
            return Err("--src and --bin are required without --cache".to_owned());
        }

        Ok(GenerateOptions {
            catalogue,
            src,
            bin,
            cache,
            config,
        })
    }
}

fn parse_count(flag: &str, value: &str) -> Result<usize, String> {
    value
        .parse()
        .map_err(|_| format!("'{flag}' expects a number, got '{value}'"))
}

fn read_entries(catalogue: &Catalogue) -> Vec<PluginEntry> {
    let entries = match catalogue {
        Catalogue::File(path) => read_catalogue_file(path),
        Catalogue::Classpath(dirs) => plugin_entries_from_dirs(dirs),
    };
    entries.unwrap_or_else(|error| fail(&error))
}

fn run_generate(options: &GenerateOptions) {
    let entries = read_entries(&options.catalogue);

    if let Some(cache_dir) = &options.cache {
        let cache = AccessorsCache::new(cache_dir);
        let class_path = cache
            .class_path_for(Fingerprint::of(&entries), |src, bin| {
                build_plugin_accessors_for(&entries, src, bin, &options.config)
            })
            .unwrap_or_else(|error| fail(&error));
        println!("src: {}", class_path.src.display());
        println!("bin: {}", class_path.bin.display());
        return;
    }

    let (Some(src), Some(bin)) = (&options.src, &options.bin) else {
        fail(&"--src and --bin are required without --cache");
    };
    let stats = build_plugin_accessors_for(&entries, src, bin, &options.config)
        .unwrap_or_else(|error| fail(&error));
    println!(
        "generated {} plugin accessor(s) in {} group(s), {} class file(s)",
        stats.plugins, stats.groups, stats.class_files
    );
}

fn run_tree(catalogue: &Path) {
    let entries = read_catalogue_file(catalogue).unwrap_or_else(|error| fail(&error));
    let trees = PluginTree::of(&entries).unwrap_or_else(|error| fail(&error));
    let accessors = plugin_accessors_of(&entries).unwrap_or_else(|error| fail(&error));

    print!("{trees}");
    println!();
    for accessor in &accessors {
        let extension = accessor.extension();
        let kind = match accessor {
            PluginAccessor::ForPlugin { .. } => "plugin",
            PluginAccessor::ForGroup { .. } => "group",
        };
        println!(
            "{}.{}: {}  [{kind} {}]",
            extension.receiver_type.source_name,
            extension.name,
            extension.return_type.source_name,
            accessor.id()
        );
    }
}

fn fail(error: &dyn std::fmt::Display) -> ! {
    eprintln!("error: {error}");
    process::exit(1);
}

fn print_generate_usage() {
    eprintln!(
        "Usage: accessorc generate (--catalogue <file> | --classpath <dir>...) --src <dir> --bin <dir> [options]"
    );
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --catalogue <file>  Catalogue file, one `id = implementation.Class` per line");
    eprintln!("  --classpath <dir>   Directory with META-INF/gradle-plugins descriptors (repeatable)");
    eprintln!("  --src <dir>         Kotlin source output directory");
    eprintln!("  --bin <dir>         Class file output directory");
    eprintln!("  --cache <dir>       Reuse or populate a fingerprint cache instead of --src/--bin");
    eprintln!("  --module <name>     Kotlin module name (default: kotlin-dsl-plugin-spec-accessors)");
    eprintln!("  -j, --jobs <n>      Write workers, 0 for available parallelism (default: 0)");
    eprintln!("  --queue <n>         Queued writes before emitters block (default: 64)");
}

fn print_usage() {
    println!("accessorc - typed plugin accessor generator");
    println!();
    println!("Usage: accessorc <command> [options]");
    println!();
    println!("Commands:");
    println!("  generate     Generate accessor sources and class files");
    println!("  tree <file>  Print the namespace tree and accessors of a catalogue file");
    println!("  help         Show this message");
    println!("  version      Show the generator version");
}
