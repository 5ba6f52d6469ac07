use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::assembler::{build_report, DecisionReport};
use crate::config::DecisionThresholds;
use crate::error::DecisionIntelError;
use crate::records::{normalize_batch, RawDisbursementRecord};
use crate::source::RecordSource;
use crate::types::{with_metadata, ComputationOutput};
use crate::DecisionResult;

/// Data-quality issues listed one by one before they are summarised.
const MAX_ISSUE_WARNINGS: usize = 20;

/// Pipeline input. Deserializes from either a bare array of raw rows or an
/// object `{ "records": [...], "thresholds": {...} }`; in the object form
/// `records` is required, `thresholds` is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "DecisionInputRepr")]
pub struct DecisionInput {
    pub records: Vec<RawDisbursementRecord>,
    pub thresholds: DecisionThresholds,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DecisionInputRepr {
    Batch(Vec<RawDisbursementRecord>),
    Wrapped {
        records: Vec<RawDisbursementRecord>,
        #[serde(default)]
        thresholds: DecisionThresholds,
    },
}

impl From<DecisionInputRepr> for DecisionInput {
    fn from(repr: DecisionInputRepr) -> Self {
        match repr {
            DecisionInputRepr::Batch(records) => DecisionInput {
                records,
                thresholds: DecisionThresholds::default(),
            },
            DecisionInputRepr::Wrapped {
                records,
                thresholds,
            } => DecisionInput {
                records,
                thresholds,
            },
        }
    }
}

/// Run the full pipeline over one batch.
///
/// Malformed fields never abort the run: they are defaulted and surface as
/// envelope warnings. The only errors are inconsistent thresholds.
pub fn analyze_decision_intelligence(
    input: &DecisionInput,
) -> DecisionResult<ComputationOutput<DecisionReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.thresholds.validate()?;

    let batch = normalize_batch(&input.records);
    for issue in batch.issues.iter().take(MAX_ISSUE_WARNINGS) {
        warnings.push(format!("Data quality: {issue}"));
    }
    if batch.issues.len() > MAX_ISSUE_WARNINGS {
        warnings.push(format!(
            "Data quality: {} further field(s) defaulted",
            batch.issues.len() - MAX_ISSUE_WARNINGS
        ));
    }
    if batch.records.is_empty() {
        warnings.push("Empty record batch; report contains zeroed totals only".into());
    }

    let report = build_report(&batch, &input.thresholds);

    let sparse = &report.analise_tendencias.categorias_dados_insuficientes;
    if !sparse.is_empty() {
        let names: Vec<&str> = sparse.iter().map(|c| c.label()).collect();
        warnings.push(format!(
            "Fewer than {} months of history, excluded from trend analysis: {}",
            input.thresholds.min_trend_months,
            names.join(", ")
        ));
    }
    for t in &report.analise_tendencias.tendencias_por_categoria {
        if t.velocidade_fixada {
            warnings.push(format!(
                "{}: growth velocity fixed by sparse-data policy, not measured",
                t.categoria
            ));
        }
    }

    log::info!(
        "decision intelligence: {} records, {} categories, {} customers, {} alerts",
        report.resumo_executivo.total_operacoes,
        report.analise_produtos.len(),
        report.resumo_executivo.total_clientes,
        report.alertas_criticos.len()
    );

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Single-pass aggregation with clamped month-over-month trend projection, \
         BCG classification and weighted opportunity scoring",
        &input.thresholds,
        warnings,
        elapsed,
        input.records.len(),
        report,
    ))
}

/// Fetch the batch from `source` and run the pipeline. A fetch failure is
/// returned as `Upstream` and no report is produced.
pub fn run_pipeline(
    source: &dyn RecordSource,
    thresholds: &DecisionThresholds,
) -> DecisionResult<ComputationOutput<DecisionReport>> {
    let records = source.fetch().map_err(|e| match e {
        DecisionIntelError::Upstream { .. } => e,
        other => DecisionIntelError::Upstream {
            source_name: source.name().to_string(),
            reason: other.to_string(),
        },
    })?;
    log::debug!("fetched {} records from '{}'", records.len(), source.name());

    analyze_decision_intelligence(&DecisionInput {
        records,
        thresholds: thresholds.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemorySource;

    struct BrokenSource;

    impl RecordSource for BrokenSource {
        fn name(&self) -> &str {
            "broken"
        }

        fn fetch(&self) -> DecisionResult<Vec<RawDisbursementRecord>> {
            Err(DecisionIntelError::SerializationError("connection reset".into()))
        }
    }

    #[test]
    fn test_input_accepts_array_and_object() {
        let a: DecisionInput = serde_json::from_str(r#"[{"id": 1}]"#).unwrap();
        assert_eq!(a.records.len(), 1);
        assert_eq!(a.thresholds, DecisionThresholds::default());

        let b: DecisionInput = serde_json::from_str(
            r#"{"records": [{"id": 1}, {"id": 2}], "thresholds": {"premium_ticket": 1000}}"#,
        )
        .unwrap();
        assert_eq!(b.records.len(), 2);
        assert_eq!(b.thresholds.premium_ticket, rust_decimal_macros::dec!(1000));
    }

    #[test]
    fn test_object_without_records_is_rejected() {
        assert!(serde_json::from_str::<DecisionInput>("{}").is_err());
        assert!(serde_json::from_str::<DecisionInput>(
            r#"{"recods": [{"id": 1, "vlr_liberado": 100, "data_entrada": "2024-01-01"}]}"#
        )
        .is_err());
        let empty: DecisionInput = serde_json::from_str(r#"{"records": []}"#).unwrap();
        assert!(empty.records.is_empty());
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let mut input = DecisionInput::default();
        input.thresholds.min_trend_months = 1;
        let err = analyze_decision_intelligence(&input).unwrap_err();
        assert!(matches!(err, DecisionIntelError::InvalidConfig { .. }));
    }

    #[test]
    fn test_upstream_failure_yields_no_report() {
        let err = run_pipeline(&BrokenSource, &DecisionThresholds::default()).unwrap_err();
        match err {
            DecisionIntelError::Upstream {
                source_name,
                reason,
            } => {
                assert_eq!(source_name, "broken");
                assert!(reason.contains("connection reset"));
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[test]
    fn test_run_pipeline_from_memory() {
        let source = InMemorySource::from_json(
            r#"[{"id": 1, "nr_cpf_cnpj": "1", "descricao": "FGTS", "vlr_liberado": 100, "data_entrada": "2024-01-02"}]"#,
        )
        .unwrap();
        let out = run_pipeline(&source, &DecisionThresholds::default()).unwrap();
        assert_eq!(out.result.resumo_executivo.total_operacoes, 1);
        assert_eq!(out.metadata.records_processed, 1);
        assert!(out
            .warnings
            .iter()
            .any(|w| w.contains("excluded from trend analysis")));
    }

    #[test]
    fn test_malformed_fields_become_warnings() {
        let input: DecisionInput =
            serde_json::from_str(r#"[{"id": 7, "vlr_liberado": "abc", "data_entrada": "ontem"}]"#)
                .unwrap();
        let out = analyze_decision_intelligence(&input).unwrap();
        assert_eq!(out.result.resumo_executivo.registros_com_falhas, 1);
        assert!(out.warnings.iter().filter(|w| w.starts_with("Data quality")).count() >= 2);
    }

    #[test]
    fn test_data_quality_warnings_are_capped() {
        let rows: Vec<RawDisbursementRecord> = (0..25)
            .map(|i| {
                serde_json::from_value(serde_json::json!({
                    "id": i,
                    "vlr_liberado": "abc",
                    "data_entrada": "2024-01-01"
                }))
                .unwrap()
            })
            .collect();
        let out = analyze_decision_intelligence(&DecisionInput {
            records: rows,
            thresholds: DecisionThresholds::default(),
        })
        .unwrap();
        let quality: Vec<&String> = out
            .warnings
            .iter()
            .filter(|w| w.starts_with("Data quality"))
            .collect();
        assert_eq!(quality.len(), MAX_ISSUE_WARNINGS + 1);
        assert_eq!(quality[MAX_ISSUE_WARNINGS], "Data quality: 5 further field(s) defaulted");
        assert_eq!(out.result.resumo_executivo.registros_com_falhas, 25);
    }
}
