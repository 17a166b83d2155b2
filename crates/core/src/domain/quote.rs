use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::numeric::{lenient, parse_count};

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct QuoteId(pub String);

impl QuoteId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QuoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored installment count for one payment line.
///
/// Storage keeps `0` as "this line is not billed", while arithmetic wants a
/// non-zero multiplier. The two readings are deliberately separate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Installments(Option<u32>);

impl Installments {
    pub const fn new(count: u32) -> Self {
        Self(Some(count))
    }

    pub const fn unset() -> Self {
        Self(None)
    }

    pub fn stored(&self) -> Option<u32> {
        self.0
    }

    /// Billing-switch reading: absent counts as a single payment, a stored
    /// zero means the customer is not charged for the line.
    pub fn billing_count(&self) -> u32 {
        self.0.unwrap_or(1)
    }

    /// Multiplier reading: absent and zero both collapse to one.
    pub fn multiplier(&self) -> u32 {
        match self.0 {
            Some(0) | None => 1,
            Some(count) => count,
        }
    }

    pub fn is_not_billed(&self) -> bool {
        self.billing_count() == 0
    }
}

impl From<u32> for Installments {
    fn from(count: u32) -> Self {
        Self::new(count)
    }
}

impl<'de> Deserialize<'de> for Installments {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self(parse_count(&value)))
    }
}

/// A budget as persisted by the back office. Field names follow the stored
/// columns; every numeric column is read leniently.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub cliente: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub descricao: Option<String>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub valor_material: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub valor_mao_obra: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub distancia_km: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub prazo_dias: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub valor_boleto: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub juros_am: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub imposto_servico: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub imposto_material: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub desconto_mdo_valor: Decimal,
    /// Display only; the absolute discount drives the math.
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub desconto_mdo_percent: Decimal,
    #[serde(default)]
    pub parcelamento_mdo: Installments,
    #[serde(default)]
    pub parcelamento_material: Installments,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub material_a_vista: bool,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub data_orcamento: Option<String>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub desconto: Decimal,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub valor_total: Decimal,
}

/// Storage hands out both numeric and textual ids.
impl<'de> Deserialize<'de> for QuoteId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(text) => Ok(Self(text)),
            Value::Number(number) => Ok(Self(number.to_string())),
            other => Err(serde::de::Error::custom(format!("unsupported quote id `{other}`"))),
        }
    }
}
