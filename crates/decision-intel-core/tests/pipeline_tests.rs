use decision_intel_core::aggregation::aggregate;
use decision_intel_core::analytics::portfolio::InvestmentTier;
use decision_intel_core::records::normalize_batch;
use decision_intel_core::report::{analyze_decision_intelligence, DecisionInput, DecisionReport};
use decision_intel_core::DecisionThresholds;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

// ===========================================================================
// Fixtures
// ===========================================================================

#[allow(clippy::too_many_arguments)]
fn row(
    id: u32,
    cpf: &str,
    desc: &str,
    inst: &str,
    city: &str,
    uf: &str,
    requested: Value,
    released: Value,
    date: &str,
) -> Value {
    json!({
        "id": id,
        "nr_cpf_cnpj": cpf,
        "descricao": desc,
        "nome_inst": inst,
        "cidade": city,
        "uf": uf,
        "valor_solic": requested,
        "vlr_liberado": released,
        "vl_financ": released,
        "data_entrada": date,
    })
}

/// Mixed batch across four categories, five months and a few malformed rows.
fn mixed_batch() -> DecisionInput {
    let rows = vec![
        row(1, "111", "SAQUE ANIVERSARIO FGTS", "Banco A", "Recife", "PE", json!(12000), json!(11000), "2024-01-10"),
        row(2, "222", "Saque FGTS", "Banco A", "Recife", "PE", json!(60000), json!(55000), "2024-02-11"),
        row(3, "111", "CREDITO PESSOAL", "Banco B", "Olinda", "PE", json!(8000), json!(8000), "2024-02-15"),
        row(4, "333", "Compra de Dívida INSS", "Banco B", "Olinda", "PE", json!(150000), json!(140000), "2024-03-01"),
        row(5, "444", "Cartão FGTS", "Banco C", "Natal", "RN", json!("25.000,00"), json!("24.500,00"), "2024-03-20T10:00:00Z"),
        row(6, "222", "NOVO S/ MARGEM", "Banco C", "Natal", "RN", json!(3000), json!(2500), "2024-04-02"),
        row(7, "555", "cartao consignado", "Banco A", "Recife", "PE", json!(5000), json!(4000), "2024-04-22"),
        row(8, "111", "FGTS antecipação", "Banco A", "Recife", "PE", json!(30000), json!(29000), "2024-05-05"),
        row(9, "666", "", "Banco D", "Caruaru", "PE", json!("n/d"), json!(-10), "sem data"),
        row(10, "777", "Portabilidade", "Banco D", "Caruaru", "PE", Value::Null, json!(1500), "2024-05-30"),
    ];
    serde_json::from_value(json!({ "records": rows })).unwrap()
}

fn run(input: &DecisionInput) -> DecisionReport {
    // RUST_LOG=debug shows the per-stage trace
    let _ = env_logger::builder().is_test(true).try_init();
    analyze_decision_intelligence(input).unwrap().result
}

// ===========================================================================
// Aggregation invariants
// ===========================================================================

#[test]
fn test_operations_and_released_value_are_conserved() {
    let input = mixed_batch();
    let batch = normalize_batch(&input.records);
    let agg = aggregate(&batch.records, &input.thresholds);

    let ops: u64 = agg.categories.values().map(|c| c.operations).sum();
    assert_eq!(ops as usize, batch.records.len());

    let by_category: Decimal = agg.categories.values().map(|c| c.released).sum();
    let by_record: Decimal = batch.records.iter().map(|r| r.released_amount).sum();
    assert_eq!(by_category, by_record);

    let report = run(&input);
    let reported: Decimal = report.analise_produtos.iter().map(|p| p.valor_liberado).sum();
    assert_eq!(reported, report.resumo_executivo.volume_total);
    assert_eq!(report.resumo_executivo.total_operacoes, 10);
}

#[test]
fn test_participation_shares_sum_to_hundred() {
    let report = run(&mixed_batch());
    let total: Decimal = report.analise_produtos.iter().map(|p| p.participacao).sum();
    assert!((total - dec!(100)).abs() < dec!(0.000001), "shares sum to {total}");
}

#[test]
fn test_malformed_rows_are_defaulted_not_fatal() {
    let out = analyze_decision_intelligence(&mixed_batch()).unwrap();
    let summary = &out.result.resumo_executivo;
    // row 9: bad requested amount, negative released, bad date
    assert_eq!(summary.registros_com_falhas, 1);
    assert!(out.warnings.iter().any(|w| w.contains("data_entrada")));
    assert_eq!(summary.total_operacoes, 10);
}

#[test]
fn test_extreme_amounts_do_not_abort_the_batch() {
    let tiny_then_large = DecisionInput {
        records: [
            (1, json!(1e-20), "2024-01-10"),
            (2, json!(1000000000), "2024-02-10"),
            (3, json!(1000000000), "2024-03-10"),
        ]
        .into_iter()
        .map(|(id, amount, date)| {
            let v = row(id, "111", "FGTS", "Banco A", "Recife", "PE", amount.clone(), amount, date);
            serde_json::from_value(v).unwrap()
        })
        .collect(),
        thresholds: DecisionThresholds::default(),
    };
    let report = run(&tiny_then_large);
    assert_eq!(report.resumo_executivo.volume_total, dec!(2000000000));
    let trend = &report.analise_tendencias.tendencias_por_categoria[0];
    assert!(trend.crescimentos.iter().all(|g| *g >= dec!(-100) && *g <= dec!(500)));

    let huge = json!("50000000000000000000000000000");
    let overflowing = DecisionInput {
        records: (1..=2)
            .map(|id| {
                let v = row(
                    id,
                    "222",
                    "FGTS",
                    "Banco A",
                    "Recife",
                    "PE",
                    huge.clone(),
                    huge.clone(),
                    "2024-01-10",
                );
                serde_json::from_value(v).unwrap()
            })
            .collect(),
        thresholds: DecisionThresholds::default(),
    };
    let out = analyze_decision_intelligence(&overflowing).unwrap();
    assert_eq!(out.result.resumo_executivo.volume_total, Decimal::ZERO);
    assert_eq!(out.result.resumo_executivo.registros_com_falhas, 2);
    assert!(out
        .warnings
        .iter()
        .any(|w| w.contains("exceeds the maximum amount")));
}

// ===========================================================================
// Determinism
// ===========================================================================

#[test]
fn test_pipeline_is_idempotent() {
    let input = mixed_batch();
    let first = serde_json::to_string(&run(&input)).unwrap();
    let second = serde_json::to_string(&run(&input)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_record_order_does_not_change_report() {
    let input = mixed_batch();
    let mut reversed = input.clone();
    reversed.records.reverse();
    let a = serde_json::to_value(run(&input)).unwrap();
    let b = serde_json::to_value(run(&reversed)).unwrap();
    assert_eq!(a, b);
}

// ===========================================================================
// Bounds
// ===========================================================================

#[test]
fn test_trend_bounds() {
    let report = run(&mixed_batch());
    for t in &report.analise_tendencias.tendencias_por_categoria {
        assert!(t.velocidade_crescimento >= dec!(-100) && t.velocidade_crescimento <= dec!(500));
        assert!(t.confianca_previsao >= Decimal::ZERO && t.confianca_previsao <= dec!(100));
        for g in &t.crescimentos {
            assert!(*g >= dec!(-100) && *g <= dec!(500));
        }
    }
}

#[test]
fn test_opportunity_scores_bounded_and_banded() {
    let report = run(&mixed_batch());
    assert_eq!(report.scoring_oportunidades.len(), report.analise_produtos.len());
    for s in &report.scoring_oportunidades {
        assert!(s.score_final >= Decimal::ZERO && s.score_final <= dec!(100));
        let expected = if s.score_final > dec!(80) {
            InvestmentTier::InvestirMassivamente
        } else if s.score_final > dec!(65) {
            InvestmentTier::Expandir
        } else if s.score_final > dec!(45) {
            InvestmentTier::Manter
        } else if s.score_final > dec!(25) {
            InvestmentTier::Reavaliar
        } else {
            InvestmentTier::Descontinuar
        };
        assert_eq!(s.categoria_investimento, expected);
    }
}

#[test]
fn test_percentages_within_range() {
    let report = run(&mixed_batch());
    for p in &report.analise_produtos {
        for v in [p.eficiencia, p.participacao, p.concentracao_clientes, p.potencial_crescimento] {
            assert!(v >= Decimal::ZERO && v <= dec!(100), "{} out of range", v);
        }
    }
    let health = report.score_saude_portfolio;
    assert!(health >= Decimal::ZERO && health <= dec!(100));
}

// ===========================================================================
// Empty input
// ===========================================================================

#[test]
fn test_empty_batch_yields_zeroed_report() {
    let out = analyze_decision_intelligence(&DecisionInput::default()).unwrap();
    let r = &out.result;
    let s = &r.resumo_executivo;
    assert_eq!(s.total_operacoes, 0);
    assert_eq!(s.volume_total, Decimal::ZERO);
    assert_eq!(s.ticket_medio_geral, Decimal::ZERO);
    assert_eq!(s.total_clientes, 0);
    assert_eq!(s.mes_pico, None);
    assert!(!s.sazonalidade_detectada);
    assert!(r.analise_produtos.is_empty());
    assert!(r.analise_geografica.is_empty());
    assert!(r.analise_instituicoes.is_empty());
    assert!(r.analise_tendencias.tendencias_por_categoria.is_empty());
    assert!(r.scoring_oportunidades.is_empty());
    assert!(r.matriz_bcg_produtos.is_empty());
    assert!(r.alertas_criticos.is_empty());
    assert!(r.insights.is_empty());
    assert!(r.janelas_oportunidade.is_empty());
    assert_eq!(r.score_saude_portfolio, Decimal::ZERO);
    assert!(r.anomalias_detectadas.is_empty());
    assert!(r.ciclo_vida_produtos.is_empty());
    assert!(r.recomendacoes_prioritarias.is_empty());
    assert!(r.probabilidade_churn.is_empty());
    assert!(r.oportunidades_crosssell.is_empty());
    assert_eq!(r.previsoes_inteligentes.potencial_receita_adicional, Decimal::ZERO);

    let json = serde_json::to_value(r).unwrap();
    assert_eq!(json["resumo_executivo"]["mes_pico"], Value::Null);
}

// ===========================================================================
// JSON round-trip
// ===========================================================================

fn assert_close(a: &Value, b: &Value, path: &str) {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap(), y.as_f64().unwrap());
            let tolerance = 1e-6 * x.abs().max(1.0);
            assert!((x - y).abs() <= tolerance, "{path}: {x} != {y}");
        }
        (Value::Array(xs), Value::Array(ys)) => {
            assert_eq!(xs.len(), ys.len(), "{path}: length");
            for (i, (x, y)) in xs.iter().zip(ys).enumerate() {
                assert_close(x, y, &format!("{path}[{i}]"));
            }
        }
        (Value::Object(xs), Value::Object(ys)) => {
            assert_eq!(xs.len(), ys.len(), "{path}: keys");
            for (k, x) in xs {
                assert_close(x, &ys[k], &format!("{path}.{k}"));
            }
        }
        _ => assert_eq!(a, b, "{path}"),
    }
}

#[test]
fn test_report_json_round_trip() {
    let report = run(&mixed_batch());
    let json = serde_json::to_string(&report).unwrap();
    let back: DecisionReport = serde_json::from_str(&json).unwrap();
    let original = serde_json::to_value(&report).unwrap();
    let restored = serde_json::to_value(&back).unwrap();
    assert_close(&original, &restored, "$");
}

#[test]
fn test_numbers_serialize_as_plain_json_numbers() {
    let report = run(&mixed_batch());
    let json = serde_json::to_value(&report).unwrap();
    assert!(json["resumo_executivo"]["volume_total"].is_number());
    assert!(json["analise_produtos"][0]["participacao"].is_number());
    assert!(json["analise_produtos"][0]["produto"].is_string());
}

// ===========================================================================
// Configuration
// ===========================================================================

#[test]
fn test_thresholds_override_changes_classification() {
    let mut input = mixed_batch();
    let base = run(&input);
    input.thresholds = DecisionThresholds {
        premium_customer_value: dec!(50000),
        ..DecisionThresholds::default()
    };
    let tuned = run(&input);
    assert!(
        tuned.resumo_executivo.clientes_premium > base.resumo_executivo.clientes_premium,
        "lower premium cutoff should add premium customers"
    );
}
