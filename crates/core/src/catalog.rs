//! Turns the flat question pool into composed tests and past-paper groupings.
//!
//! Everything here is a pure function of its input; the only internal state is
//! the random source used to sample the full mock.

use std::collections::HashMap;

use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::debug;

use crate::model::{
    Category, PaperDescriptor, PaperKey, Question, Test, TestId, TestKind,
};

/// Per-section caps when sampling the full mock.
pub const FULL_MOCK_VARC_CAP: usize = 24;
pub const FULL_MOCK_DILR_CAP: usize = 20;
pub const FULL_MOCK_QUANT_CAP: usize = 22;

/// A sampled full mock with this many questions or fewer is replaced by the
/// whole catalog.
pub const FULL_MOCK_MIN_QUESTIONS: usize = 5;

pub const FULL_MOCK_MINUTES: u32 = 120;
pub const SECTIONAL_MINUTES: u32 = 40;
pub const PYQ_MINUTES: u32 = 120;
pub const PRACTICE_MINUTES: u32 = 5;

pub const FULL_MOCK_ID: &str = "full-mock";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("no questions available for {year} {slot}")]
    NotFound { year: String, slot: String },
}

/// Group questions into `(year, slot)` papers, newest year first, then slot ascending.
///
/// Years compare lexicographically, which orders four-digit years correctly;
/// `Unknown` sorts above any numeric year.
#[must_use]
pub fn build_paper_descriptors(questions: &[Question]) -> Vec<PaperDescriptor> {
    let mut counts: HashMap<PaperKey, usize> = HashMap::new();
    for question in questions {
        *counts.entry(question.paper_key()).or_default() += 1;
    }

    let mut papers: Vec<PaperDescriptor> = counts
        .into_iter()
        .map(|(key, question_count)| PaperDescriptor {
            key,
            question_count,
        })
        .collect();
    papers.sort_by(|a, b| {
        b.year()
            .cmp(a.year())
            .then_with(|| a.slot().cmp(b.slot()))
    });
    papers
}

/// Build the full mock plus one sectional test per category using the thread RNG.
///
/// See [`build_mocks_with_rng`].
#[must_use]
pub fn build_mocks(questions: &[Question]) -> Vec<Test> {
    build_mocks_with_rng(questions, &mut rand::rng())
}

/// Build the full mock plus one sectional test per category.
///
/// Emission order is full mock, Quant, VARC, DILR; tests that would be empty
/// are skipped. The full mock samples each section independently (uniform
/// shuffle, then truncate to the section cap) and concatenates VARC, DILR,
/// Quant. Sectional tests keep catalog order and are not truncated.
pub fn build_mocks_with_rng<R: Rng + ?Sized>(questions: &[Question], rng: &mut R) -> Vec<Test> {
    let quant = by_category(questions, Category::Quant);
    let varc = by_category(questions, Category::Varc);
    let dilr = by_category(questions, Category::Dilr);

    let mut full = Vec::with_capacity(FULL_MOCK_VARC_CAP + FULL_MOCK_DILR_CAP + FULL_MOCK_QUANT_CAP);
    full.extend(sample(&varc, FULL_MOCK_VARC_CAP, rng));
    full.extend(sample(&dilr, FULL_MOCK_DILR_CAP, rng));
    full.extend(sample(&quant, FULL_MOCK_QUANT_CAP, rng));
    if full.len() <= FULL_MOCK_MIN_QUESTIONS {
        debug!(
            sampled = full.len(),
            catalog = questions.len(),
            "catalog too small for a sampled full mock, using every question"
        );
        full = questions.to_vec();
    }

    let mut tests = Vec::with_capacity(4);
    tests.extend(
        Test::new(
            TestId::new(FULL_MOCK_ID),
            "Full Length Mock",
            FULL_MOCK_MINUTES,
            full,
            TestKind::Mock,
        )
        .ok(),
    );

    for (category, subset) in [
        (Category::Quant, quant),
        (Category::Varc, varc),
        (Category::Dilr, dilr),
    ] {
        tests.extend(
            Test::new(
                sectional_id(category),
                format!("{category} Sectional"),
                SECTIONAL_MINUTES,
                subset,
                TestKind::Mock,
            )
            .ok(),
        );
    }

    tests
}

/// Build the previous-year paper for `(year, slot)`.
///
/// Questions without a year or slot tag match the `Unknown` / `Slot 1` defaults.
///
/// # Errors
///
/// Returns `CatalogError::NotFound` when no question carries that key.
pub fn build_pyq_test(questions: &[Question], year: &str, slot: &str) -> Result<Test, CatalogError> {
    let key = PaperKey::new(year, slot);
    let matching: Vec<Question> = questions
        .iter()
        .filter(|q| q.paper_key() == key)
        .cloned()
        .collect();

    let not_found = || CatalogError::NotFound {
        year: year.to_string(),
        slot: slot.to_string(),
    };
    if matching.is_empty() {
        return Err(not_found());
    }

    Test::new(
        pyq_id(&key),
        format!("{key} Paper"),
        PYQ_MINUTES,
        matching,
        TestKind::Pyq,
    )
    .map_err(|_| not_found())
}

/// Wrap one question into a short practice test.
#[must_use]
pub fn build_practice_test(question: &Question) -> Test {
    Test::single(
        practice_id(question),
        format!("Practice: {} #{}", question.category(), question.id()),
        PRACTICE_MINUTES,
        question.clone(),
        TestKind::Practice,
    )
}

#[must_use]
pub fn sectional_id(category: Category) -> TestId {
    TestId::new(format!("sectional-{}", category.slug()))
}

#[must_use]
pub fn pyq_id(key: &PaperKey) -> TestId {
    TestId::new(format!("pyq-{}", key.slug()))
}

#[must_use]
pub fn practice_id(question: &Question) -> TestId {
    TestId::new(format!("practice-{}", question.id()))
}

fn by_category(questions: &[Question], category: Category) -> Vec<Question> {
    questions
        .iter()
        .filter(|q| q.category() == category)
        .cloned()
        .collect()
}

fn sample<R: Rng + ?Sized>(subset: &[Question], cap: usize, rng: &mut R) -> Vec<Question> {
    let mut picked = subset.to_vec();
    picked.shuffle(rng);
    picked.truncate(cap);
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionDraft, QuestionId};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn q(id: u64, category: Category, year: Option<&str>, slot: Option<&str>) -> Question {
        QuestionDraft {
            id: QuestionId::new(id),
            question: format!("Question {id}"),
            passage: None,
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: 0,
            explanation: None,
            category,
            is_premium: false,
            year: year.map(str::to_string),
            slot: slot.map(str::to_string),
        }
        .validate()
        .unwrap()
    }

    fn balanced_catalog(per_category: u64) -> Vec<Question> {
        let mut out = Vec::new();
        let mut id = 0;
        for category in Category::ALL {
            for _ in 0..per_category {
                id += 1;
                out.push(q(id, category, Some("2023"), None));
            }
        }
        out
    }

    #[test]
    fn paper_descriptors_sort_year_desc() {
        let questions = vec![
            q(1, Category::Quant, Some("2021"), Some("Slot 1")),
            q(2, Category::Quant, Some("2023"), Some("Slot 1")),
            q(3, Category::Quant, Some("2022"), Some("Slot 1")),
        ];
        let years: Vec<_> = build_paper_descriptors(&questions)
            .iter()
            .map(|p| p.year().to_string())
            .collect();
        assert_eq!(years, vec!["2023", "2022", "2021"]);
    }

    #[test]
    fn paper_descriptors_break_ties_by_slot_and_count_members() {
        let questions = vec![
            q(1, Category::Varc, Some("2023"), Some("Slot 3")),
            q(2, Category::Varc, Some("2023"), Some("Slot 1")),
            q(3, Category::Dilr, Some("2023"), Some("Slot 1")),
            q(4, Category::Dilr, Some("2023"), None),
        ];
        let papers = build_paper_descriptors(&questions);
        assert_eq!(papers.len(), 2);
        assert_eq!(papers[0].slot(), "Slot 1");
        assert_eq!(papers[0].question_count, 3);
        assert_eq!(papers[1].slot(), "Slot 3");
        assert_eq!(papers[1].question_count, 1);
    }

    #[test]
    fn paper_descriptors_apply_unknown_year() {
        let papers = build_paper_descriptors(&[q(1, Category::Quant, None, None)]);
        assert_eq!(papers[0].year(), "Unknown");
        assert_eq!(papers[0].slot(), "Slot 1");
    }

    #[test]
    fn full_mock_respects_section_caps() {
        let mut rng = StdRng::seed_from_u64(7);
        let mocks = build_mocks_with_rng(&balanced_catalog(30), &mut rng);

        assert_eq!(mocks.len(), 4);
        let full = &mocks[0];
        assert_eq!(full.id().as_str(), FULL_MOCK_ID);
        assert_eq!(full.len(), 66);

        let sections: Vec<_> = full.questions().iter().map(Question::category).collect();
        assert!(sections[..24].iter().all(|c| *c == Category::Varc));
        assert!(sections[24..44].iter().all(|c| *c == Category::Dilr));
        assert!(sections[44..].iter().all(|c| *c == Category::Quant));

        let unique: HashSet<_> = full.questions().iter().map(Question::id).collect();
        assert_eq!(unique.len(), 66);

        for sectional in &mocks[1..] {
            assert_eq!(sectional.len(), 30);
        }
    }

    #[test]
    fn sectionals_emit_in_fixed_order_and_keep_catalog_order() {
        let catalog = balanced_catalog(3);
        let mocks = build_mocks_with_rng(&catalog, &mut StdRng::seed_from_u64(1));
        let ids: Vec<_> = mocks.iter().map(|t| t.id().as_str().to_string()).collect();
        assert_eq!(
            ids,
            vec!["full-mock", "sectional-quant", "sectional-varc", "sectional-dilr"]
        );

        let quant_ids: Vec<_> = mocks[1].questions().iter().map(|q| q.id().value()).collect();
        assert_eq!(quant_ids, vec![1, 2, 3]);
    }

    #[test]
    fn tiny_catalog_falls_back_to_everything() {
        let catalog = vec![
            q(1, Category::Quant, None, None),
            q(2, Category::Varc, None, None),
            q(3, Category::Dilr, None, None),
        ];
        let mocks = build_mocks_with_rng(&catalog, &mut StdRng::seed_from_u64(3));
        assert_eq!(mocks[0].questions(), catalog.as_slice());
    }

    #[test]
    fn empty_categories_are_skipped() {
        let catalog: Vec<_> = (1..=8).map(|i| q(i, Category::Quant, None, None)).collect();
        let mocks = build_mocks_with_rng(&catalog, &mut StdRng::seed_from_u64(3));
        let ids: Vec<_> = mocks.iter().map(|t| t.id().as_str().to_string()).collect();
        assert_eq!(ids, vec!["full-mock", "sectional-quant"]);
    }

    #[test]
    fn empty_catalog_builds_nothing() {
        assert!(build_mocks(&[]).is_empty());
    }

    #[test]
    fn shuffle_reaches_every_position() {
        let catalog: Vec<_> = (1..=4).map(|i| q(i, Category::Varc, None, None)).collect();
        let mut rng = StdRng::seed_from_u64(42);
        let mut firsts = HashSet::new();
        for _ in 0..200 {
            let picked = sample(&catalog, 4, &mut rng);
            firsts.insert(picked[0].id());
        }
        assert_eq!(firsts.len(), 4);
    }

    #[test]
    fn pyq_filters_by_default_aware_key() {
        let catalog = vec![
            q(1, Category::Quant, Some("2022"), None),
            q(2, Category::Varc, Some("2022"), Some("Slot 1")),
            q(3, Category::Dilr, Some("2022"), Some("Slot 2")),
        ];
        let test = build_pyq_test(&catalog, "2022", "Slot 1").unwrap();
        assert_eq!(test.len(), 2);
        assert_eq!(test.kind(), TestKind::Pyq);
        assert_eq!(test.id().as_str(), "pyq-2022-slot-1");
    }

    #[test]
    fn pyq_without_members_is_not_found() {
        let catalog = vec![q(1, Category::Quant, Some("2022"), None)];
        let err = build_pyq_test(&catalog, "2019", "Slot 1").unwrap_err();
        assert_eq!(
            err,
            CatalogError::NotFound {
                year: "2019".into(),
                slot: "Slot 1".into()
            }
        );
    }

    #[test]
    fn practice_wraps_single_question() {
        let question = q(9, Category::Dilr, None, None);
        let test = build_practice_test(&question);
        assert_eq!(test.len(), 1);
        assert_eq!(test.duration_minutes(), PRACTICE_MINUTES);
        assert_eq!(test.kind(), TestKind::Practice);
        assert_eq!(test.id().as_str(), "practice-9");
    }
}
