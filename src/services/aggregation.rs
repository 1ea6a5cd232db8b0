use crate::connectors::{AnswerIndex, AnswerQuery, TermBucket};
use crate::models::AnswerIntention;
use crate::services::errors::FormError;
use chrono::{Months, NaiveDate};
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub answer_text: String,
    pub intention: AnswerIntention,
    pub answer_score: i64,
    pub doc_count: i64,
}

impl From<&TermBucket> for Bucket {
    fn from(term: &TermBucket) -> Self {
        Self {
            answer_text: term.answer_text.clone(),
            intention: term.intention,
            answer_score: term.intention.score(),
            doc_count: term.doc_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub total: i64,
    pub average: f64,
    pub field_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldAggregation {
    pub buckets: Vec<Bucket>,
    pub metadata: Metadata,
}

/// Buckets keyed by `MM/YY`, oldest month first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalAggregation {
    pub buckets: IndexMap<String, Vec<Bucket>>,
    pub metadata: Metadata,
}

/// Weighted score per `MM/YY` month, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalAverage {
    pub buckets: IndexMap<String, f64>,
    pub metadata: Metadata,
}

fn round_one(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Stable sort on intention rank, the index order is kept among equal intentions.
pub fn sort_buckets(buckets: &mut [Bucket]) {
    buckets.sort_by_key(|bucket| bucket.intention.rank());
}

/// Σ(score × count) / total, one decimal. 0 for an empty set.
pub fn weighted_average(buckets: &[Bucket]) -> f64 {
    let total: i64 = buckets.iter().map(|b| b.doc_count).sum();
    if total == 0 {
        return 0.0;
    }
    let points: i64 = buckets.iter().map(|b| b.answer_score * b.doc_count).sum();
    round_one(points as f64 / total as f64)
}

/// Label of the most recent answer across `terms`.
fn latest_label<'a>(terms: impl IntoIterator<Item = &'a TermBucket>) -> Option<String> {
    terms
        .into_iter()
        .max_by_key(|term| term.latest_at)
        .map(|term| term.field_label.clone())
}

fn month_key(month: NaiveDate) -> String {
    month.format("%m/%y").to_string()
}

/// Every first-of-month from `first` to `last` inclusive.
fn month_range(first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    let mut months = vec![];
    let mut current = first;
    while current <= last {
        months.push(current);
        current = match current.checked_add_months(Months::new(1)) {
            Some(next) => next,
            None => break,
        };
    }
    months
}

#[tracing::instrument(name = "Aggregate by field code", skip(index))]
pub async fn aggregate_by_field_code(
    index: &dyn AnswerIndex,
    query: &AnswerQuery,
) -> Result<FieldAggregation, FormError> {
    let terms = index.term_buckets(query).await?;
    let total = index.count(query).await?;

    let mut buckets: Vec<Bucket> = terms.iter().map(Bucket::from).collect();
    sort_buckets(&mut buckets);

    Ok(FieldAggregation {
        metadata: Metadata {
            total,
            average: weighted_average(&buckets),
            field_label: latest_label(&terms),
        },
        buckets,
    })
}

/// Buckets per month. The metadata average is the mean answer count over months that had
/// answers; months between the first and last ones are present with no buckets.
#[tracing::instrument(name = "Aggregate by field code per month", skip(index))]
pub async fn aggregate_by_field_code_interval(
    index: &dyn AnswerIndex,
    query: &AnswerQuery,
) -> Result<IntervalAggregation, FormError> {
    let months = index.monthly_term_buckets(query).await?;
    let total = index.count(query).await?;

    let mut by_month: IndexMap<NaiveDate, Vec<Bucket>> = IndexMap::new();
    if let (Some(first), Some(last)) = (months.first(), months.last()) {
        for month in month_range(first.month, last.month) {
            by_month.insert(month, vec![]);
        }
    }
    for month in months.iter() {
        let mut buckets: Vec<Bucket> = month.terms.iter().map(Bucket::from).collect();
        sort_buckets(&mut buckets);
        by_month.insert(month.month, buckets);
    }
    let field_label = latest_label(months.iter().flat_map(|month| month.terms.iter()));

    let filled = months.iter().filter(|month| !month.terms.is_empty()).count();
    let average = if filled == 0 {
        0.0
    } else {
        round_one(total as f64 / filled as f64)
    };

    Ok(IntervalAggregation {
        buckets: by_month
            .into_iter()
            .map(|(month, buckets)| (month_key(month), buckets))
            .collect(),
        metadata: Metadata {
            total,
            average,
            field_label,
        },
    })
}

/// Weighted score per month. Months without answers score 0 and count in the overall mean.
#[tracing::instrument(name = "Aggregate average by field code per month", skip(index))]
pub async fn aggregate_by_field_code_interval_average(
    index: &dyn AnswerIndex,
    query: &AnswerQuery,
) -> Result<IntervalAverage, FormError> {
    let interval = aggregate_by_field_code_interval(index, query).await?;

    let buckets: IndexMap<String, f64> = interval
        .buckets
        .iter()
        .map(|(key, buckets)| (key.clone(), weighted_average(buckets)))
        .collect();
    let average = if buckets.is_empty() {
        0.0
    } else {
        round_one(buckets.values().sum::<f64>() / buckets.len() as f64)
    };

    Ok(IntervalAverage {
        buckets,
        metadata: Metadata {
            average,
            ..interval.metadata
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::answer_index::InMemoryAnswerIndex;
    use crate::models::Answer;
    use chrono::{TimeZone, Utc};

    fn answer(text: &str, intention: AnswerIntention, (y, m, d): (i32, u32, u32)) -> Answer {
        Answer {
            answer_text: Some(text.to_string()),
            intention,
            field_code: Some("satisfaction".to_string()),
            field_label: "Satisfaction".to_string(),
            product_id: 5,
            created_at: Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
            ..Default::default()
        }
    }

    fn repeat(n: usize, text: &str, intention: AnswerIntention, day: (i32, u32, u32)) -> Vec<Answer> {
        (0..n).map(|_| answer(text, intention, day)).collect()
    }

    fn query() -> AnswerQuery {
        AnswerQuery {
            field_code: "satisfaction".to_string(),
            product_id: 5,
            button_id: None,
            start: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn totals_order_and_average() {
        let mut answers = repeat(1, "Mauvaise", AnswerIntention::Bad, (2024, 3, 1));
        answers.extend(repeat(3, "Moyenne", AnswerIntention::Medium, (2024, 3, 2)));
        answers.extend(repeat(6, "Bonne", AnswerIntention::Good, (2024, 3, 3)));
        let index = InMemoryAnswerIndex::new(answers);

        let result = aggregate_by_field_code(&index, &query()).await.unwrap();

        assert_eq!(10, result.metadata.total);
        assert_eq!(7.5, result.metadata.average);
        assert_eq!(Some("Satisfaction".to_string()), result.metadata.field_label);
        assert_eq!(
            vec![AnswerIntention::Good, AnswerIntention::Medium, AnswerIntention::Bad],
            result.buckets.iter().map(|b| b.intention).collect::<Vec<_>>()
        );
        assert_eq!(vec![6, 3, 1], result.buckets.iter().map(|b| b.doc_count).collect::<Vec<_>>());
        assert_eq!(10, result.buckets[0].answer_score);
    }

    #[tokio::test]
    async fn relabelled_block_reports_latest_label() {
        let mut answers = repeat(5, "Bonne", AnswerIntention::Good, (2024, 2, 1));
        let mut renamed = answer("Mauvaise", AnswerIntention::Bad, (2024, 4, 1));
        renamed.field_label = "Votre ressenti".to_string();
        answers.push(renamed);
        let index = InMemoryAnswerIndex::new(answers);

        let result = aggregate_by_field_code(&index, &query()).await.unwrap();
        assert_eq!(AnswerIntention::Good, result.buckets[0].intention);
        assert_eq!(Some("Votre ressenti".to_string()), result.metadata.field_label);

        let result = aggregate_by_field_code_interval(&index, &query()).await.unwrap();
        assert_eq!(Some("Votre ressenti".to_string()), result.metadata.field_label);
    }

    #[tokio::test]
    async fn empty_result_is_zero() {
        let index = InMemoryAnswerIndex::default();
        let result = aggregate_by_field_code(&index, &query()).await.unwrap();

        assert_eq!(0, result.metadata.total);
        assert_eq!(0.0, result.metadata.average);
        assert!(result.buckets.is_empty());
    }

    #[tokio::test]
    async fn same_text_with_different_intentions_stays_apart() {
        let mut answers = repeat(2, "Oui", AnswerIntention::Good, (2024, 5, 1));
        answers.extend(repeat(1, "Oui", AnswerIntention::Neutral, (2024, 5, 1)));
        let index = InMemoryAnswerIndex::new(answers);

        let result = aggregate_by_field_code(&index, &query()).await.unwrap();
        assert_eq!(2, result.buckets.len());
        assert_eq!(AnswerIntention::Neutral, result.buckets[1].intention);
        assert_eq!(6.7, result.metadata.average);
    }

    #[tokio::test]
    async fn other_products_and_dates_are_filtered_out() {
        let mut answers = repeat(2, "Bonne", AnswerIntention::Good, (2024, 5, 1));
        let mut other = answer("Bonne", AnswerIntention::Good, (2024, 5, 1));
        other.product_id = 6;
        answers.push(other);
        answers.push(answer("Bonne", AnswerIntention::Good, (2023, 12, 31)));
        let index = InMemoryAnswerIndex::new(answers);

        let result = aggregate_by_field_code(&index, &query()).await.unwrap();
        assert_eq!(2, result.metadata.total);
    }

    #[tokio::test]
    async fn interval_fills_gap_months() {
        let mut answers = repeat(2, "Bonne", AnswerIntention::Good, (2024, 1, 15));
        answers.extend(repeat(4, "Mauvaise", AnswerIntention::Bad, (2024, 3, 2)));
        let index = InMemoryAnswerIndex::new(answers);

        let result = aggregate_by_field_code_interval(&index, &query()).await.unwrap();

        assert_eq!(
            vec!["01/24", "02/24", "03/24"],
            result.buckets.keys().map(String::as_str).collect::<Vec<_>>()
        );
        assert!(result.buckets["02/24"].is_empty());
        assert_eq!(6, result.metadata.total);
        assert_eq!(3.0, result.metadata.average);
    }

    #[tokio::test]
    async fn interval_average_scores_each_month() {
        let mut answers = repeat(2, "Bonne", AnswerIntention::Good, (2024, 1, 15));
        answers.extend(repeat(1, "Moyenne", AnswerIntention::Medium, (2024, 3, 2)));
        answers.extend(repeat(1, "Bonne", AnswerIntention::Good, (2024, 3, 20)));
        let index = InMemoryAnswerIndex::new(answers);

        let result = aggregate_by_field_code_interval_average(&index, &query())
            .await
            .unwrap();

        assert_eq!(Some(&10.0), result.buckets.get("01/24"));
        assert_eq!(Some(&0.0), result.buckets.get("02/24"));
        assert_eq!(Some(&7.5), result.buckets.get("03/24"));
        assert_eq!(5.8, result.metadata.average);
        assert_eq!(4, result.metadata.total);
    }

    #[test]
    fn month_range_crosses_years() {
        let months = month_range(
            NaiveDate::from_ymd_opt(2023, 11, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        );
        assert_eq!(
            vec!["11/23", "12/23", "01/24", "02/24"],
            months.into_iter().map(month_key).collect::<Vec<_>>()
        );
    }
}
