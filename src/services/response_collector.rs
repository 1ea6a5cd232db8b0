use crate::db;
use crate::forms::AnswerInput;
use crate::models::{Answer, AnswerIntention, Review};
use crate::services::effective_form::{EffectiveBlock, EffectiveForm};
use crate::services::errors::{FormError, ValidationError};
use sqlx::PgPool;
use std::collections::{BTreeSet, HashMap};

/// Checks `answers` against the form the respondent was shown and builds the rows to store.
///
/// Review ids, product scope and timestamps are filled in at write time.
pub fn validate_answers(
    form: &EffectiveForm,
    answers: &[AnswerInput],
) -> Result<Vec<Answer>, ValidationError> {
    let mut errors = ValidationError::default();
    let mut invalid_blocks = BTreeSet::new();
    let mut answered = BTreeSet::new();
    let mut rejected = BTreeSet::new();
    let mut per_block: HashMap<i32, usize> = HashMap::new();
    let mut chosen = BTreeSet::new();
    let mut rows = Vec::with_capacity(answers.len());

    for input in answers {
        let block = match form.find_block(input.block_id) {
            Some(block) if !block.type_bloc.is_content() => block,
            _ => {
                invalid_blocks.insert(input.block_id);
                continue;
            }
        };

        let count = per_block.entry(block.id).or_insert(0);
        *count += 1;
        if *count > 1 && !block.type_bloc.accepts_many() {
            invalid_blocks.insert(block.id);
            continue;
        }
        // one row per ticked option, even on blocks taking several
        if let Some(option_id) = input.answer_item_id {
            if block.type_bloc.is_choice() && !chosen.insert((block.id, option_id)) {
                invalid_blocks.insert(block.id);
                continue;
            }
        }

        if block.type_bloc.is_choice() {
            match choice_answer(block, input) {
                Ok(Some(row)) => {
                    answered.insert(block.id);
                    rows.push(row);
                }
                Ok(None) => {
                    invalid_blocks.insert(block.id);
                }
                Err(option_id) => {
                    rejected.insert(block.id);
                    errors.invalid_options.push(option_id);
                }
            }
        } else {
            match text_answer(block, input) {
                Ok(Some(row)) => {
                    answered.insert(block.id);
                    rows.push(row);
                }
                Ok(None) => {}
                Err(block_id) => {
                    rejected.insert(block_id);
                    errors.oversized_fields.push(block_id);
                }
            }
        }
    }

    errors.missing_blocks = form
        .blocks()
        .filter(|block| block.is_required && !answered.contains(&block.id))
        // a rejected answer is reported once, not also as missing
        .filter(|block| !rejected.contains(&block.id) && !invalid_blocks.contains(&block.id))
        .map(|block| block.id)
        .collect();
    errors.invalid_blocks = invalid_blocks.into_iter().collect();

    if errors.is_empty() {
        Ok(rows)
    } else {
        Err(errors)
    }
}

/// `Ok(None)` when no option id was sent, `Err(option_id)` when the option is not visible.
fn choice_answer(block: &EffectiveBlock, input: &AnswerInput) -> Result<Option<Answer>, i32> {
    let option_id = match input.answer_item_id {
        Some(id) => id,
        None => return Ok(None),
    };
    let option = block.find_option(option_id).ok_or(option_id)?;

    Ok(Some(Answer {
        block_id: block.id,
        answer_item_id: Some(option.id),
        answer_text: Some(option.label.clone()),
        intention: option.intention.unwrap_or_default(),
        field_code: block.field_code.clone(),
        field_label: block.display_label().to_string(),
        ..Default::default()
    }))
}

/// `Ok(None)` for blank text, `Err(block_id)` when over the block's length limit.
fn text_answer(block: &EffectiveBlock, input: &AnswerInput) -> Result<Option<Answer>, i32> {
    let text = match input.answer_text.as_deref() {
        Some(text) if !text.trim().is_empty() => text,
        _ => return Ok(None),
    };
    if let Some(max) = block.type_bloc.max_length() {
        if text.chars().count() > max {
            return Err(block.id);
        }
    }

    Ok(Some(Answer {
        block_id: block.id,
        answer_item_id: None,
        answer_text: Some(text.to_string()),
        intention: AnswerIntention::Neutral,
        field_code: block.field_code.clone(),
        field_label: block.display_label().to_string(),
        ..Default::default()
    }))
}

/// Validates then stores one review and its answers in a single transaction.
#[tracing::instrument(name = "Submit review", skip(pool, form, answers))]
pub async fn submit_review(
    pool: &PgPool,
    form: &EffectiveForm,
    button_id: Option<i32>,
    answers: &[AnswerInput],
) -> Result<Review, FormError> {
    let rows = validate_answers(form, answers).map_err(|errors| {
        tracing::info!("Rejected review for product {}: {}", form.product_id, errors);
        FormError::Validation(errors)
    })?;

    let review = Review {
        product_id: form.product_id,
        form_id: form.form_id,
        button_id,
        form_config_id: form.form_config_id,
        form_config_version: form.config_version,
        answers: rows,
        ..Default::default()
    };

    db::review::insert(pool, review)
        .await
        .map_err(FormError::Transaction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConfigKind;
    use crate::services::effective_form::resolve;
    use crate::models::INPUT_TEXT_AREA_MAX_LENGTH;
    use crate::models::TypeBloc;
    use crate::services::effective_form::tests::{
        block, config, option, sample_product, sample_template,
    };

    fn choice(block_id: i32, option_id: i32) -> AnswerInput {
        AnswerInput {
            block_id,
            answer_item_id: Some(option_id),
            answer_text: None,
        }
    }

    fn text(block_id: i32, text: &str) -> AnswerInput {
        AnswerInput {
            block_id,
            answer_item_id: None,
            answer_text: Some(text.to_string()),
        }
    }

    fn raw_form() -> EffectiveForm {
        resolve(&sample_template(), None, &sample_product(), None)
    }

    #[test]
    fn required_answer_alone_is_enough() {
        let rows = validate_answers(&raw_form(), &[choice(11, 112)]).unwrap();

        assert_eq!(1, rows.len());
        assert_eq!(Some("Bonne".to_string()), rows[0].answer_text);
        assert_eq!(AnswerIntention::Good, rows[0].intention);
        assert_eq!(Some("satisfaction".to_string()), rows[0].field_code);
        assert_eq!("Block 11", rows[0].field_label);
    }

    #[test]
    fn missing_required_block_is_named() {
        let errors = validate_answers(&raw_form(), &[text(21, "hi")]).unwrap_err();
        assert_eq!(vec![11], errors.missing_blocks);
        assert!(errors.invalid_options.is_empty());
    }

    #[test]
    fn hidden_option_is_rejected() {
        let config = config(1, &[(ConfigKind::BlockOption, 111)], &[]);
        let form = resolve(&sample_template(), Some(&config), &sample_product(), None);

        let errors = validate_answers(&form, &[choice(11, 111)]).unwrap_err();
        assert_eq!(vec![111], errors.invalid_options);
        assert!(errors.missing_blocks.is_empty());
    }

    #[test]
    fn option_of_another_block_is_rejected() {
        let errors = validate_answers(&raw_form(), &[choice(11, 112), choice(20, 110)]).unwrap_err();
        assert_eq!(vec![110], errors.invalid_options);
    }

    #[test]
    fn oversized_text_is_rejected_not_truncated() {
        let long = "a".repeat(INPUT_TEXT_AREA_MAX_LENGTH + 1);
        let errors = validate_answers(&raw_form(), &[choice(11, 110), text(21, &long)]).unwrap_err();
        assert_eq!(vec![21], errors.oversized_fields);

        let exact = "é".repeat(INPUT_TEXT_AREA_MAX_LENGTH);
        assert!(validate_answers(&raw_form(), &[choice(11, 110), text(21, &exact)]).is_ok());
    }

    #[test]
    fn answers_to_hidden_or_content_blocks_are_rejected() {
        let config = config(1, &[(ConfigKind::Block, 21)], &[]);
        let form = resolve(&sample_template(), Some(&config), &sample_product(), None);

        let errors = validate_answers(&form, &[choice(11, 110), text(21, "hi"), text(10, "x")])
            .unwrap_err();
        assert_eq!(vec![10, 21], errors.invalid_blocks);
    }

    #[test]
    fn single_choice_block_takes_one_answer() {
        let errors = validate_answers(&raw_form(), &[choice(11, 110), choice(11, 112)]).unwrap_err();
        assert_eq!(vec![11], errors.invalid_blocks);
        assert!(errors.missing_blocks.is_empty());
    }

    #[test]
    fn checkbox_takes_each_option_once() {
        let mut template = sample_template();
        let mut channels = block(30, 2, 2, TypeBloc::Checkbox);
        channels.options = vec![option(300, 30, 0, "Courrier"), option(301, 30, 1, "Email")];
        template.steps[0].blocks.push(channels);
        let form = resolve(&template, None, &sample_product(), None);

        let rows = validate_answers(&form, &[choice(11, 112), choice(30, 300), choice(30, 301)])
            .unwrap();
        assert_eq!(3, rows.len());

        let errors = validate_answers(
            &form,
            &[choice(30, 300), choice(11, 112), choice(30, 300), choice(30, 300)],
        )
        .unwrap_err();
        assert_eq!(vec![30], errors.invalid_blocks);
        assert!(errors.missing_blocks.is_empty());
    }

    #[test]
    fn blank_optional_text_is_skipped() {
        let rows = validate_answers(&raw_form(), &[choice(11, 111), text(21, "   ")]).unwrap();
        assert_eq!(1, rows.len());
        assert_eq!(AnswerIntention::Medium, rows[0].intention);
    }

    #[test]
    fn option_without_intention_is_neutral() {
        let rows = validate_answers(&raw_form(), &[choice(11, 110), choice(20, 200)]).unwrap();
        assert_eq!(AnswerIntention::Neutral, rows[1].intention);
        assert_eq!(Some(200), rows[1].answer_item_id);
    }
}
