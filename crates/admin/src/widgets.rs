//! Dashboard statistics and pie-chart models.

use rust_decimal::Decimal;
use schoolsoft_core::{ClassId, Kes};

use crate::api::{ApiClient, ApiError, NamedValue};

/// Slice colors, cycled.
pub const CHART_PALETTE: [&str; 6] = [
    "#9F7AEA", "#4C51BF", "#38B2AC", "#ED8936", "#FC8181", "#4299E1",
];

/// Shown in place of a chart with nothing to draw.
pub const NO_DATA: &str = "No data available";

/// Everything on the dashboard landing screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardData {
    pub students: u64,
    pub teachers: u64,
    pub classes: u64,
    pub payment_modes: Vec<NamedValue>,
}

impl DashboardData {
    /// Fetch counts and today's payment modes together.
    ///
    /// # Errors
    ///
    /// Returns the first `ApiError`; one failing request fails the whole screen.
    pub async fn fetch(client: &ApiClient) -> Result<Self, ApiError> {
        let (students, teachers, classes, payment_modes) = tokio::try_join!(
            client.student_count(),
            client.teacher_count(),
            client.class_count(),
            client.payment_modes_today(),
        )?;

        Ok(Self {
            students,
            teachers,
            classes,
            payment_modes,
        })
    }

    #[must_use]
    pub fn payment_modes_chart(&self) -> Chart {
        payment_modes_chart(&self.payment_modes)
    }
}

/// One pie slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSlice {
    pub name: String,
    pub value: Decimal,
    pub color: &'static str,
    /// `None` for zero-valued slices.
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chart {
    Empty,
    Slices(Vec<ChartSlice>),
}

impl Chart {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    #[must_use]
    pub fn slices(&self) -> &[ChartSlice] {
        match self {
            Self::Empty => &[],
            Self::Slices(slices) => slices,
        }
    }
}

fn build_chart(values: &[NamedValue], label: impl Fn(&NamedValue) -> String) -> Chart {
    let slices = values
        .iter()
        .zip(CHART_PALETTE.into_iter().cycle())
        .map(|(entry, color)| ChartSlice {
            name: entry.name.clone(),
            value: entry.value,
            color,
            label: (!entry.value.is_zero()).then(|| label(entry)),
        })
        .collect();
    Chart::Slices(slices)
}

/// Today's revenue per payment mode, labelled `MPESA : KES 1,500.00`.
///
/// Empty when there are no modes or every value is zero.
#[must_use]
pub fn payment_modes_chart(values: &[NamedValue]) -> Chart {
    if values.iter().all(|entry| entry.value.is_zero()) {
        return Chart::Empty;
    }
    build_chart(values, |entry| {
        format!("{} : {}", entry.name, Kes::new(entry.value))
    })
}

/// Paid/unpaid breakdown with capitalized labels.
#[must_use]
pub fn fee_status_chart(values: &[NamedValue]) -> Chart {
    if values.is_empty() {
        return Chart::Empty;
    }
    build_chart(values, |entry| capitalize_words(&entry.name))
}

/// Fetch the fee status chart for the selected class.
///
/// Returns `Ok(None)` without touching the network until a class is chosen.
///
/// # Errors
///
/// Returns `ApiError` if the request fails.
pub async fn load_fee_status(
    client: &ApiClient,
    class_id: Option<ClassId>,
) -> Result<Option<Chart>, ApiError> {
    let Some(class_id) = class_id else {
        return Ok(None);
    };
    let values = client.fee_status(class_id).await?;
    Ok(Some(fee_status_chart(&values)))
}

/// Upper-case the first letter of every word.
#[must_use]
pub fn capitalize_words(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn nv(name: &str, value: i64) -> NamedValue {
        NamedValue {
            name: name.to_string(),
            value: Decimal::from(value),
        }
    }

    #[test]
    fn test_payment_modes_empty_cases() {
        assert!(payment_modes_chart(&[]).is_empty());
        assert!(payment_modes_chart(&[nv("MPESA", 0), nv("CASH", 0)]).is_empty());
    }

    #[test]
    fn test_payment_modes_labels_and_colors() {
        let chart = payment_modes_chart(&[nv("MPESA", 1500), nv("CASH", 0), nv("BANK", 20_000)]);
        let slices = chart.slices();
        assert_eq!(slices.len(), 3);
        assert_eq!(slices[0].label.as_deref(), Some("MPESA : KES 1,500.00"));
        assert_eq!(slices[1].label, None);
        assert_eq!(slices[2].color, "#38B2AC");
    }

    #[test]
    fn test_palette_cycles() {
        let values: Vec<_> = (1..=7).map(|i| nv(&format!("m{i}"), i)).collect();
        let chart = payment_modes_chart(&values);
        assert_eq!(chart.slices()[6].color, CHART_PALETTE[0]);
    }

    #[test]
    fn test_fee_status_capitalized() {
        let chart = fee_status_chart(&[nv("fully paid", 12), nv("not paid", 0)]);
        assert_eq!(chart.slices()[0].label.as_deref(), Some("Fully Paid"));
        assert_eq!(chart.slices()[1].label, None);
        assert!(fee_status_chart(&[]).is_empty());
    }

    #[test]
    fn test_capitalize_words() {
        assert_eq!(capitalize_words("partially paid"), "Partially Paid");
        assert_eq!(capitalize_words(""), "");
    }

    #[tokio::test]
    async fn test_fee_status_disabled_without_class() {
        let client = ApiClient::new(
            url::Url::parse("http://127.0.0.1:9/api/").unwrap(),
            std::time::Duration::from_millis(100),
        )
        .unwrap();
        assert!(load_fee_status(&client, None).await.unwrap().is_none());
    }
}
