use clap::{Args, Parser, Subcommand};
use hexmapgen::preview::save_preview_png;
use hexmapgen::{DEFAULT_MAX_ATTEMPTS, MapConfig, MapGenerator, MapSnapshot};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Генератор гексагональных карт фронтира
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Сгенерировать одну карту и сохранить её в JSON
    Generate {
        #[command(flatten)]
        common: CommonArgs,

        #[arg(short, long, default_value_t = 42)]
        seed: u64,

        /// Путь для сохранения карты (по умолчанию: ./map.json)
        #[arg(short, long, default_value = "map.json")]
        output: PathBuf,

        /// Дополнительно сохранить PNG-предпросмотр
        #[arg(long)]
        preview: Option<PathBuf>,
    },
    /// Прогнать много сидов и собрать статистику качества карт
    Batch {
        #[command(flatten)]
        common: CommonArgs,

        #[arg(long, default_value_t = 1)]
        start_seed: u64,

        #[arg(short = 'n', long, default_value_t = 20)]
        count: u32,
    },
    /// Проверить сохранённую карту
    Validate {
        /// Путь к конфигурационному файлу в формате TOML
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Карта в JSON, сохранённая командой generate
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Путь к конфигурационному файлу в формате TOML (по умолчанию: встроенная конфигурация)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Максимум попыток генерации на один сид
    #[arg(short, long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    attempts: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Generate {
            common,
            seed,
            output,
            preview,
        } => generate(&common, seed, &output, preview.as_deref()),
        Command::Batch {
            common,
            start_seed,
            count,
        } => batch(&common, start_seed, count),
        Command::Validate { config, input } => validate(config.as_deref(), &input),
    }
}

fn load_config(path: Option<&Path>) -> Result<MapConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            println!("🔍 Загрузка конфигурации из {}...", path.display());
            Ok(MapConfig::from_toml_file(path)?)
        }
        None => Ok(MapConfig::default()),
    }
}

fn generate(
    common: &CommonArgs,
    seed: u64,
    output: &Path,
    preview: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(common.config.as_deref())?;
    println!(
        "Генерация карты {}×{} (сид {seed}, попыток не больше {})...",
        config.map.width, config.map.height, common.attempts
    );

    let mut generator = MapGenerator::new(config);
    let accepted = generator.generate_complete_map(seed, common.attempts);

    if let Some(result) = generator.last_validation() {
        for warning in &result.warnings {
            println!("  ⚠ {warning}");
        }
        for error in &result.errors {
            println!("  ✗ {error}");
        }
    }

    println!("Сохранение в {}", output.display());
    generator.snapshot().save(output)?;

    if let Some(path) = preview {
        println!("Сохранение предпросмотра в {}", path.display());
        save_preview_png(
            path,
            generator.grid(),
            generator.rivers(),
            generator.locations(),
            generator.config(),
        )?;
    }

    if accepted {
        println!(
            "\nГотово! Карта принята с попытки {} (сид {}): рек {}, локаций {}.",
            generator.attempts_used(),
            generator.seed(),
            generator.rivers().len(),
            generator.locations().len()
        );
    } else {
        println!("\nПопытки исчерпаны: сохранена лучшая карта, она не прошла проверку.");
    }
    Ok(())
}

/// Сообщение без чисел, чтобы одинаковые проблемы складывались вместе
fn normalize(message: &str) -> String {
    message.chars().filter(|c| !c.is_ascii_digit()).collect()
}

fn print_top(title: &str, counts: &HashMap<String, usize>, limit: usize) {
    if counts.is_empty() {
        return;
    }
    let mut sorted: Vec<(&String, &usize)> = counts.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    println!("\n{title}:");
    for (message, count) in sorted.into_iter().take(limit) {
        println!("  {count:>4} × {message}");
    }
}

fn batch(common: &CommonArgs, start_seed: u64, count: u32) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(common.config.as_deref())?;
    let mut generator = MapGenerator::new(config);

    let mut passed = 0u32;
    let mut total_attempts = 0u32;
    let mut errors: HashMap<String, usize> = HashMap::new();
    let mut warnings: HashMap<String, usize> = HashMap::new();

    for offset in 0..count {
        let seed = start_seed.wrapping_add(u64::from(offset));
        if generator.generate_complete_map(seed, common.attempts) {
            passed += 1;
        }
        total_attempts += generator.attempts_used();

        if let Some(result) = generator.last_validation() {
            for error in &result.errors {
                *errors.entry(normalize(error)).or_insert(0) += 1;
            }
            for warning in &result.warnings {
                *warnings.entry(normalize(warning)).or_insert(0) += 1;
            }
        }
    }

    let runs = count.max(1) as f32;
    println!("\nПрогонов: {count}");
    println!("Принято: {passed} ({:.1}%)", passed as f32 / runs * 100.0);
    println!("Среднее число попыток: {:.2}", total_attempts as f32 / runs);
    print_top("Частые ошибки", &errors, 5);
    print_top("Частые предупреждения", &warnings, 5);
    Ok(())
}

fn validate(config: Option<&Path>, input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config)?;
    let snapshot = MapSnapshot::load(input)?;

    let mut generator = MapGenerator::new(config);
    generator.load_snapshot(snapshot)?;
    let result = generator.validate();

    println!("{}", serde_json::to_string_pretty(&result)?);
    if result.valid {
        println!("\n✓ Карта корректна");
    } else {
        println!("\n✗ Ошибок: {}", result.errors.len());
    }
    Ok(())
}
