mod attempt;
mod ids;
mod marking;
mod question;
mod test_definition;

pub use ids::{AttemptId, OptionId, ParseIdError, QuestionId, TestSlug};

pub use attempt::{AnswerMap, AnswerOutcome, Phase, Scorecard, SubmissionKind};
pub use marking::{MarkingScheme, MarkingSchemeError};
pub use question::{AnswerOption, Difficulty, Question, QuestionDraft, QuestionError};
pub use test_definition::{
    Category, DifficultySplit, ParseCategoryError, TestDefinition, TestDefinitionError, TestDraft,
};
