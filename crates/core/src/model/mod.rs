mod ids;
mod name;
mod question;
mod repository;
mod subject;
mod unit;

pub use ids::{ParseIdError, QuestionId};
pub use name::{NameError, NodeName};
pub use question::{
    AnswerError, AnswerLetter, OPTION_COUNT, Question, QuestionDraft, QuestionError,
    strip_option_label,
};
pub use repository::{
    NodeKind, OwnerList, QuestionLocation, Repository, RepositoryError, UnitPath,
};
pub use subject::{Category, Subject};
pub use unit::{Unit, UnitPartsError};
