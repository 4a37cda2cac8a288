pub mod edit_suggestion;
pub mod report;
pub mod restaurant;
pub mod review;
pub mod reviewer_application;
pub mod submission;
pub mod user;

pub use edit_suggestion::{ChangeSet, DecisionStatus, EditSuggestion, FieldChange};
pub use report::{Report, ReportAction, ReportStatus};
pub use restaurant::{
    Coordinates, Inclusion, ListingStatus, PracticalInfo, PriceCategory, Restaurant,
    RestaurantDraft,
};
pub use review::{NewReview, Review};
pub use reviewer_application::{ApplicationStats, ReviewerApplication};
pub use submission::{ReviewerComment, Submission, SubmissionAction};
pub use user::User;
