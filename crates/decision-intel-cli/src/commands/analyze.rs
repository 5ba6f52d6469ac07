use clap::Args;
use serde_json::Value;

use decision_intel_core::report::{analyze_decision_intelligence, DecisionInput};

use crate::input;

/// Report sections selectable with `--section`.
const SECTIONS: [&str; 21] = [
    "resumo_executivo",
    "analise_produtos",
    "analise_geografica",
    "analise_instituicoes",
    "analise_tendencias",
    "scoring_oportunidades",
    "matriz_bcg_produtos",
    "inteligencia_comportamental",
    "alertas_criticos",
    "concentracao_risco",
    "insights",
    "oportunidades",
    "analise_comportamental",
    "janelas_oportunidade",
    "score_saude_portfolio",
    "anomalias_detectadas",
    "ciclo_vida_produtos",
    "recomendacoes_prioritarias",
    "previsoes_inteligentes",
    "probabilidade_churn",
    "oportunidades_crosssell",
];

/// Arguments for a full pipeline run
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to JSON records file (array, or object with `records`)
    #[arg(long)]
    pub input: Option<String>,

    /// Thresholds file (JSON or YAML); overrides inline thresholds
    #[arg(long)]
    pub config: Option<String>,

    /// Print a single report section instead of the full envelope
    #[arg(long)]
    pub section: Option<String>,
}

/// Arguments for the trend-only view
#[derive(Args)]
pub struct TrendsArgs {
    /// Path to JSON records file (array, or object with `records`)
    #[arg(long)]
    pub input: Option<String>,

    /// Thresholds file (JSON or YAML)
    #[arg(long)]
    pub config: Option<String>,
}

fn load_input(
    path: Option<&str>,
    config: Option<&str>,
) -> Result<DecisionInput, Box<dyn std::error::Error>> {
    let mut decision_input: DecisionInput = if let Some(path) = path {
        input::file::read_records(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input file (or records piped on stdin) is required".into());
    };

    if let Some(cfg) = config {
        decision_input.thresholds = input::config::read_thresholds(cfg)?;
    }
    Ok(decision_input)
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let decision_input = load_input(args.input.as_deref(), args.config.as_deref())?;
    let output = analyze_decision_intelligence(&decision_input)?;
    let value = serde_json::to_value(output)?;

    match args.section {
        None => Ok(value),
        Some(section) => {
            if !SECTIONS.contains(&section.as_str()) {
                return Err(format!(
                    "Unknown section '{}'; expected one of: {}",
                    section,
                    SECTIONS.join(", ")
                )
                .into());
            }
            Ok(value["result"][section.as_str()].clone())
        }
    }
}

pub fn run_trends(args: TrendsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let decision_input = load_input(args.input.as_deref(), args.config.as_deref())?;
    let output = analyze_decision_intelligence(&decision_input)?;
    let mut value = serde_json::to_value(output)?;

    // keep the envelope, narrow the result
    let trends = value["result"]["analise_tendencias"].take();
    value["result"] = trends;
    Ok(value)
}
