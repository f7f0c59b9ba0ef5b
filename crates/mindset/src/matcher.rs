use crate::advice::{Advice, Role};

const GENERAL: &str = "general";

/// Does this advice apply to a game of `subject` played in `role`?
///
/// Both checks are case-insensitive substring tests on the raw comma-joined tag
/// strings, so a subject of "Phi" matches a "Malphite" tag. Kept that way for
/// compatibility with existing sheets.
pub fn applies_to(advice: &Advice, role: Role, subject: &str) -> bool {
  let roles = advice.role_tags.to_lowercase();
  let subjects = advice.subject_tags.to_lowercase();

  let role_match = roles.contains(GENERAL) || roles.contains(&role.as_str().to_lowercase());
  let subject_match = subjects.contains(GENERAL) || subjects.contains(&subject.to_lowercase());

  role_match && subject_match
}

/// The advice relevant to an upcoming game, in knowledge-base order
pub fn match_advice<'a, I>(advice: I, role: Role, subject: &str) -> Vec<Advice>
where
  I: IntoIterator<Item = &'a Advice>,
{
  advice.into_iter().filter(|a| applies_to(a, role, subject)).cloned().collect()
}
