use super::{AnswerIndex, AnswerQuery, MonthBucket, TermBucket};
use crate::connectors::ConnectorError;
use crate::models;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};

/// Answer index over a fixed list of answers, ordered like the database one.
#[derive(Default)]
pub struct InMemoryAnswerIndex {
    pub answers: Vec<models::Answer>,
}

impl InMemoryAnswerIndex {
    pub fn new(answers: Vec<models::Answer>) -> Self {
        Self { answers }
    }

    fn matching<'a>(&'a self, query: &'a AnswerQuery) -> impl Iterator<Item = &'a models::Answer> {
        self.answers.iter().filter(move |answer| {
            answer.field_code.as_deref() == Some(query.field_code.as_str())
                && answer.product_id == query.product_id
                && query.button_id.map_or(true, |id| answer.button_id == Some(id))
                && answer.created_at >= query.start
                && answer.created_at < query.end
        })
    }
}

fn group<'a>(answers: impl Iterator<Item = &'a models::Answer>) -> Vec<TermBucket> {
    let mut buckets: Vec<TermBucket> = vec![];
    for answer in answers {
        let text = answer.answer_text.clone().unwrap_or_default();
        match buckets
            .iter_mut()
            .find(|b| b.answer_text == text && b.intention == answer.intention)
        {
            Some(bucket) => {
                bucket.doc_count += 1;
                if answer.created_at > bucket.latest_at {
                    bucket.latest_at = answer.created_at;
                    bucket.field_label = answer.field_label.clone();
                }
            }
            None => buckets.push(TermBucket {
                answer_text: text,
                intention: answer.intention,
                field_label: answer.field_label.clone(),
                latest_at: answer.created_at,
                doc_count: 1,
            }),
        }
    }
    buckets.sort_by(|a, b| {
        b.doc_count
            .cmp(&a.doc_count)
            .then_with(|| a.answer_text.cmp(&b.answer_text))
    });
    buckets
}

#[async_trait]
impl AnswerIndex for InMemoryAnswerIndex {
    async fn count(&self, query: &AnswerQuery) -> Result<i64, ConnectorError> {
        Ok(self.matching(query).count() as i64)
    }

    async fn term_buckets(&self, query: &AnswerQuery) -> Result<Vec<TermBucket>, ConnectorError> {
        Ok(group(self.matching(query)))
    }

    async fn monthly_term_buckets(
        &self,
        query: &AnswerQuery,
    ) -> Result<Vec<MonthBucket>, ConnectorError> {
        let mut months: Vec<NaiveDate> = self
            .matching(query)
            .filter_map(|a| NaiveDate::from_ymd_opt(a.created_at.year(), a.created_at.month(), 1))
            .collect();
        months.sort();
        months.dedup();

        Ok(months
            .into_iter()
            .map(|month| MonthBucket {
                month,
                terms: group(self.matching(query).filter(|a| {
                    a.created_at.year() == month.year() && a.created_at.month() == month.month()
                })),
            })
            .collect())
    }
}
