//! Shader Evolution CLI - Rank a population snapshot and checkpoint it.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use shader_evolution::{
    compute::{GenerationLedger, LineageGraph, Population, SelectionPlan},
    schema::{Artifact, ArtifactKind, RunConfig, SelectionConfig},
};

/// Population snapshot read from disk.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    run: RunConfig,
    artifacts: Vec<Artifact>,
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <snapshot.json> [generation]", args[0]);
        eprintln!();
        eprintln!("Rank a population snapshot by fitness and novelty.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  snapshot.json  Run configuration and artifacts");
        eprintln!("  generation     Generation number to checkpoint (default: 0)");
        eprintln!();
        eprintln!("An example snapshot is printed with the --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_snapshot();
        return;
    }

    let snapshot_path = PathBuf::from(&args[1]);
    let generation: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(0);

    let snapshot_str = fs::read_to_string(&snapshot_path).unwrap_or_else(|e| {
        eprintln!("Error reading snapshot file: {}", e);
        std::process::exit(1);
    });

    let snapshot: Snapshot = serde_json::from_str(&snapshot_str).unwrap_or_else(|e| {
        eprintln!("Error parsing snapshot: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = snapshot.run.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    let mut population = Population::new();
    if let Err(e) = population.add_all(snapshot.artifacts) {
        eprintln!("Error loading artifacts: {}", e);
        std::process::exit(1);
    }

    let selection = &snapshot.run.selection;

    println!("Shader Evolution");
    println!("================");
    println!("Members: {}", population.len());
    println!(
        "Scored: {} fitness, {} embedded",
        population.iter().filter(|a| a.fitness().is_some()).count(),
        population.iter().filter(|a| a.embedding().is_some()).count()
    );
    println!();

    println!("Best by fitness:");
    for artifact in population.get_best(selection.elite_count.max(1)) {
        match artifact.fitness() {
            Some(f) => println!("  {}  {:.4}", artifact.id(), f),
            None => println!("  {}  unscored", artifact.id()),
        }
    }
    println!();

    let ranked = population
        .rank_by_novelty(selection.k_neighbors)
        .unwrap_or_else(|e| {
            eprintln!("Error scoring novelty: {}", e);
            std::process::exit(1);
        });
    println!("Most novel (k = {}):", selection.k_neighbors);
    for score in ranked.iter().take(selection.novelty_count.max(1)) {
        println!("  {}  {:.4}", score.id, score.score);
    }
    println!();

    let plan = SelectionPlan::build(&population, selection).unwrap_or_else(|e| {
        eprintln!("Error selecting survivors: {}", e);
        std::process::exit(1);
    });
    println!(
        "Selected {} survivors ({} elite, {} novel, {} random)",
        plan.len(),
        plan.elites.len(),
        plan.novel.len(),
        plan.random.len()
    );

    let lineage = LineageGraph::from_artifacts(population.iter());
    println!("Lineage roots: {}", lineage.roots().len());

    if let Some(dir) = &snapshot.run.ledger_dir {
        let entry = GenerationLedger::in_dir(dir)
            .and_then(|ledger| population.checkpoint(&ledger, generation))
            .unwrap_or_else(|e| {
                eprintln!("Error writing ledger: {}", e);
                std::process::exit(1);
            });
        println!(
            "Checkpointed generation {} ({} members) at {}",
            entry.generation(),
            entry.count(),
            entry.timestamp().to_rfc3339()
        );
    }
}

fn print_example_snapshot() {
    let parent = {
        let mut a = Artifact::from_genome(
            ArtifactKind::Shader,
            "precision mediump float;\nvarying vec2 uv;\nuniform float time;\nvoid main() { gl_FragColor = vec4(uv, 0.5 + 0.5 * sin(time), 1.0); }",
            Some("a calm gradient".to_string()),
        );
        a.set_fitness(0.6);
        a.set_embedding(vec![0.9, 0.1, 0.0]);
        a
    };
    let mut child = Artifact::mutation_child(
        &parent,
        "add concentric rings",
        "precision mediump float;\nvarying vec2 uv;\nuniform float time;\nvoid main() { float r = length(uv - 0.5); gl_FragColor = vec4(vec3(sin(r * 40.0 - time)), 1.0); }",
    );
    child.set_embedding(vec![0.2, 0.7, 0.1]);

    let snapshot = Snapshot {
        run: RunConfig {
            selection: SelectionConfig::default(),
            ledger_dir: Some(PathBuf::from("output")),
        },
        artifacts: vec![parent, child],
    };

    println!("Example snapshot (snapshot.json):");
    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error encoding example: {}", e),
    }
}
