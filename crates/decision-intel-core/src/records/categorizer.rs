use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed set of product categories. Serialized with the labels the
/// dashboard displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProductCategory {
    #[serde(rename = "Compra de Dívida")]
    CompraDeDivida,
    #[serde(rename = "FGTS")]
    Fgts,
    #[serde(rename = "Crédito Pessoal")]
    CreditoPessoal,
    #[serde(rename = "Novo Crediário")]
    NovoCrediario,
    #[serde(rename = "Cartão de Crédito")]
    CartaoDeCredito,
    #[serde(rename = "Outros")]
    Outros,
}

impl ProductCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ProductCategory::CompraDeDivida => "Compra de Dívida",
            ProductCategory::Fgts => "FGTS",
            ProductCategory::CreditoPessoal => "Crédito Pessoal",
            ProductCategory::NovoCrediario => "Novo Crediário",
            ProductCategory::CartaoDeCredito => "Cartão de Crédito",
            ProductCategory::Outros => "Outros",
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordered substring rules; the first rule with any matching needle wins.
/// The debt-purchase needles include the common "compre" misspelling seen
/// in the feed.
const RULES: &[(&[&str], ProductCategory)] = &[
    (
        &["compra de d", "compra de divida", "compre de d"],
        ProductCategory::CompraDeDivida,
    ),
    (&["fgts"], ProductCategory::Fgts),
    (
        &["crédito pessoal", "credito pessoal"],
        ProductCategory::CreditoPessoal,
    ),
    (&["novo s/"], ProductCategory::NovoCrediario),
    (&["cartão", "cartao"], ProductCategory::CartaoDeCredito),
];

/// Resolve a free-text product description to its category.
///
/// Matching is case-insensitive (Unicode lower-casing, so "CRÉDITO" matches
/// "crédito"). Missing or empty descriptions resolve to `Outros`.
pub fn categorize(description: Option<&str>) -> ProductCategory {
    let desc = match description {
        Some(d) if !d.trim().is_empty() => d.to_lowercase(),
        _ => return ProductCategory::Outros,
    };

    RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| desc.contains(n)))
        .map(|(_, category)| *category)
        .unwrap_or(ProductCategory::Outros)
}
