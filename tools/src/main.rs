//! standards-runner: headless runner for the standards engine.
//!
//! Usage:
//!   standards-runner --seed 12345 --participants 40 --category potensi
//!   standards-runner --db demo.db --tolerance 10 --ipc-mode

mod demo;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use standards_core::{
    config::EngineConfig,
    custom_standard::CustomStandardDraft,
    engine::StandardsEngine,
    import::{self, TemplateFixture},
    ranking::{CombinedRankingQuery, Page, RankingQuery},
    session::InMemorySessionCarrier,
    source::CatalogSource,
    store::AssessmentStore,
    types::{Code, CustomStandardId, EventId, ParticipantId, PositionId, TemplateId},
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetRankings {
        category_code: String,
        tolerance_percent: Option<f64>,
        page: Option<Page>,
    },
    GetCombinedRankings {
        tolerance_percent: Option<f64>,
        page: Option<Page>,
    },
    GetFinalAssessment {
        participant_id: ParticipantId,
        tolerance_percent: Option<f64>,
    },
    GetDistribution {
        aspect_code: String,
    },
    GetEffectiveStandard,
    SetCategoryWeight {
        code: String,
        weight: Option<f64>,
    },
    SetAspectWeight {
        code: String,
        weight: Option<f64>,
    },
    SetAspectActive {
        code: String,
        active: Option<bool>,
    },
    SetAspectRating {
        code: String,
        rating: Option<f64>,
    },
    SetSubAspectActive {
        code: String,
        active: Option<bool>,
    },
    SetSubAspectRating {
        code: String,
        rating: Option<i64>,
    },
    ResetSession,
    SaveCustomStandard {
        draft: CustomStandardDraft,
    },
    SelectCustomStandard {
        custom_standard_id: Option<CustomStandardId>,
    },
    CacheStats,
    Quit,
}

/// The imported scope every command runs against.
struct Scope {
    template_id: TemplateId,
    event_id: EventId,
    position_id: PositionId,
    tolerance_percent: f64,
}

type Engine = StandardsEngine<AssessmentStore>;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let participants = parse_arg(&args, "--participants", 20usize);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = string_arg(&args, "--db").unwrap_or(":memory:");
    let data_dir = string_arg(&args, "--data-dir").unwrap_or("./data");
    let category = string_arg(&args, "--category").unwrap_or("potensi");

    let config = EngineConfig::load(data_dir)?;
    let tolerance = parse_arg(&args, "--tolerance", config.ranking.tolerance_percent);

    if !ipc_mode {
        println!("standards-runner");
        println!("  seed:          {seed}");
        println!("  participants:  {participants}");
        println!("  tolerance:     {tolerance}%");
        println!("  db:            {db}");
        println!("  data_dir:      {data_dir}");
        println!();
    }

    let store = if db == ":memory:" {
        AssessmentStore::in_memory()?
    } else {
        AssessmentStore::open(db)?
    };
    store.migrate()?;

    let fixture: TemplateFixture =
        import::load_fixture(&format!("{data_dir}/demo_template.json"))?;
    let template_id = match store.template_id_by_code(&fixture.code)? {
        Some(id) => id,
        None => import::import_template(&store, &fixture)?,
    };
    let catalog = store
        .load_template_catalog(template_id)?
        .with_context(|| format!("template {template_id} vanished after import"))?;

    let event_code = format!("demo-{seed}-{}", unix_seconds());
    let cohort = demo::demo_cohort(&catalog, &event_code, participants, seed);
    let summary = import::import_assessments(&store, &cohort)?;
    let position_id = *summary
        .position_ids
        .first()
        .context("demo cohort produced no position")?;

    let scope = Scope {
        template_id,
        event_id: summary.event_id,
        position_id,
        tolerance_percent: tolerance,
    };
    let mut engine = StandardsEngine::new(store, config, Box::new(InMemorySessionCarrier::new()));

    if ipc_mode {
        run_ipc_loop(&mut engine, &scope)?;
    } else {
        print_summary(&mut engine, &scope, category)?;
    }

    Ok(())
}

fn run_ipc_loop(engine: &mut Engine, scope: &Scope) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                writeln!(stdout, "{}", json!({ "error": e.to_string() }))?;
                stdout.flush()?;
                continue;
            }
        };
        if matches!(cmd, IpcCommand::Quit) {
            break;
        }

        let response = match handle_command(engine, scope, cmd) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("ipc: command failed: {e:#}");
                json!({ "error": format!("{e:#}") })
            }
        };
        writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn handle_command(engine: &mut Engine, scope: &Scope, cmd: IpcCommand) -> Result<Value> {
    let template_id = scope.template_id;
    let value = match cmd {
        IpcCommand::GetRankings { category_code, tolerance_percent, page } => {
            let query = RankingQuery {
                event_id: scope.event_id,
                position_id: scope.position_id,
                template_id,
                category_code: Code::new(category_code),
                tolerance_percent: tolerance_percent.unwrap_or(scope.tolerance_percent),
                page,
            };
            serde_json::to_value(engine.get_rankings(&query)?)?
        }
        IpcCommand::GetCombinedRankings { tolerance_percent, page } => {
            let query = CombinedRankingQuery {
                event_id: scope.event_id,
                position_id: scope.position_id,
                template_id,
                tolerance_percent: tolerance_percent.unwrap_or(scope.tolerance_percent),
                page,
            };
            serde_json::to_value(engine.get_combined_rankings(&query)?)?
        }
        IpcCommand::GetFinalAssessment { participant_id, tolerance_percent } => {
            let tolerance = tolerance_percent.unwrap_or(scope.tolerance_percent);
            serde_json::to_value(engine.get_final_assessment(participant_id, tolerance)?)?
        }
        IpcCommand::GetDistribution { aspect_code } => {
            let aspect_id = engine
                .catalog(template_id)?
                .and_then(|c| c.aspect_by_code(&aspect_code).map(|a| a.aspect_id))
                .with_context(|| format!("unknown aspect '{aspect_code}'"))?;
            serde_json::to_value(engine.get_distribution_data(
                scope.event_id,
                scope.position_id,
                aspect_id,
                template_id,
            )?)?
        }
        IpcCommand::GetEffectiveStandard => {
            serde_json::to_value(engine.effective_standard(template_id)?)?
        }
        IpcCommand::SetCategoryWeight { code, weight } => {
            engine.set_session_category_weight(template_id, &code, weight);
            session_state(engine, template_id)?
        }
        IpcCommand::SetAspectWeight { code, weight } => {
            engine.set_session_aspect_weight(template_id, &code, weight);
            session_state(engine, template_id)?
        }
        IpcCommand::SetAspectActive { code, active } => {
            engine.set_session_aspect_active(template_id, &code, active);
            session_state(engine, template_id)?
        }
        IpcCommand::SetAspectRating { code, rating } => {
            engine.set_session_aspect_rating(template_id, &code, rating);
            session_state(engine, template_id)?
        }
        IpcCommand::SetSubAspectActive { code, active } => {
            engine.set_session_sub_aspect_active(template_id, &code, active);
            session_state(engine, template_id)?
        }
        IpcCommand::SetSubAspectRating { code, rating } => {
            engine.set_session_sub_aspect_rating(template_id, &code, rating);
            session_state(engine, template_id)?
        }
        IpcCommand::ResetSession => {
            engine.reset_session(template_id);
            session_state(engine, template_id)?
        }
        IpcCommand::SaveCustomStandard { draft } => {
            serde_json::to_value(engine.save_custom_standard(&draft)?)?
        }
        IpcCommand::SelectCustomStandard { custom_standard_id } => {
            engine.select_custom_standard(template_id, custom_standard_id)?;
            json!({ "selected": custom_standard_id, "fingerprint": engine.fingerprint(template_id)? })
        }
        IpcCommand::CacheStats => serde_json::to_value(engine.cache_stats())?,
        IpcCommand::Quit => Value::Null,
    };
    Ok(value)
}

fn session_state(engine: &mut Engine, template_id: TemplateId) -> Result<Value> {
    Ok(json!({
        "session": engine.session_adjustments(template_id),
        "fingerprint": engine.fingerprint(template_id)?,
    }))
}

fn print_summary(engine: &mut Engine, scope: &Scope, category: &str) -> Result<()> {
    let rankings = engine.get_rankings(&RankingQuery {
        event_id: scope.event_id,
        position_id: scope.position_id,
        template_id: scope.template_id,
        category_code: Code::from(category),
        tolerance_percent: scope.tolerance_percent,
        page: None,
    })?;

    println!("=== RANKING: {category} ===");
    for r in &rankings.items {
        println!(
            "  #{:<3} {:<28} score {:>7.2} / {:>7.2}  gap {:>7.2}  {}",
            r.rank,
            r.name,
            r.figures.individual_score,
            r.figures.standard_score,
            r.figures.gap_score,
            r.figures.conclusion.label()
        );
    }
    let s = rankings.summary;
    println!(
        "  {} ranked | above {} | meets {} | below {} | pass rate {:.2}%",
        rankings.total, s.above_standard, s.meets_standard, s.below_standard, s.pass_rate
    );

    let combined = engine.get_combined_rankings(&CombinedRankingQuery {
        event_id: scope.event_id,
        position_id: scope.position_id,
        template_id: scope.template_id,
        tolerance_percent: scope.tolerance_percent,
        page: None,
    })?;
    println!();
    println!("=== COMBINED RANKING ===");
    for r in &combined.items {
        let parts: Vec<String> = r
            .categories
            .iter()
            .map(|c| format!("{} {:.2}", c.code, c.figures.individual_score))
            .collect();
        println!(
            "  #{:<3} {:<28} total {:>7.2}  [{}]  {}",
            r.rank,
            r.name,
            r.figures.individual_score,
            parts.join(", "),
            r.figures.conclusion.label()
        );
    }

    let first_aspect = engine
        .catalog(scope.template_id)?
        .and_then(|c| {
            c.category_by_code(category)
                .and_then(|cat| cat.aspects.first())
                .map(|a| (a.aspect_id, a.name.clone()))
        });
    if let Some((aspect_id, name)) = first_aspect {
        let data = engine.get_distribution_data(
            scope.event_id,
            scope.position_id,
            aspect_id,
            scope.template_id,
        )?;
        println!();
        println!("=== DISTRIBUTION: {name} ===");
        for (level, count) in &data.distribution {
            println!("  {level}: {count:>3} {}", "#".repeat(*count));
        }
        println!(
            "  standard {:.2} | average {:.2} | median {:.2} | sd {:.2} | n {}",
            data.standard_rating,
            data.average_rating,
            data.median_rating,
            data.std_deviation,
            data.participant_count
        );
    }

    let stats = engine.cache_stats();
    println!();
    println!("=== CACHE ===");
    println!("  catalog loads:     {}", stats.catalog_loads);
    println!(
        "  category rankings: {} hits / {} misses",
        stats.category_rankings.hits, stats.category_rankings.misses
    );
    if let Some(fp) = engine.fingerprint(scope.template_id)? {
        println!("  fingerprint:       {fp}");
    }
    Ok(())
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn unix_seconds() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
