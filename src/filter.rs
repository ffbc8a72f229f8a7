//! Constraint filter: narrow a category's questions by level and domain,
//! falling back to the whole category when too few survive.

use tracing::{debug, warn};

use crate::domain::{LevelFilter, QuestionRecord};

/// Domain value meaning "no domain filtering".
pub const ALL_DOMAINS: &str = "all";

#[derive(Clone, Debug)]
pub struct FilterCriteria<'a> {
  pub level: LevelFilter,
  pub domain: Option<&'a str>,
  pub num_questions: usize,
}

#[derive(Clone, Debug)]
pub struct FilterOutcome {
  pub questions: Vec<QuestionRecord>,
  /// Set when the filtered set was too small and the full category was returned.
  pub relaxed: bool,
}

/// Apply level and (when `supports_domain`) domain filtering.
///
/// If fewer than `num_questions` records survive, every filter is dropped and
/// the full input is returned. There is no partial relaxation.
pub fn filter_questions(all: &[QuestionRecord], criteria: &FilterCriteria<'_>, supports_domain: bool) -> FilterOutcome {
  let domain = criteria
    .domain
    .map(str::trim)
    .filter(|d| supports_domain && !d.is_empty() && !d.eq_ignore_ascii_case(ALL_DOMAINS));

  let filtered: Vec<QuestionRecord> = all
    .iter()
    .filter(|q| criteria.level.admits(q.level))
    .filter(|q| domain.map_or(true, |d| q.matches_domain(d)))
    .cloned()
    .collect();

  if filtered.len() < criteria.num_questions {
    warn!(
      target: "selection",
      available = filtered.len(),
      requested = criteria.num_questions,
      level = criteria.level.as_str(),
      domain = domain.unwrap_or(ALL_DOMAINS),
      "Only {} questions match the criteria; including other levels/domains", filtered.len()
    );
    return FilterOutcome { questions: all.to_vec(), relaxed: true };
  }

  debug!(target: "selection", kept = filtered.len(), total = all.len(), "Filtered question pool");
  FilterOutcome { questions: filtered, relaxed: false }
}
