// Participant ID (uuid v4)
pub type ParticipantId = String;
// Question ID from the question bank
pub type QuestionId = u32;
// Durations counted in whole seconds
pub type Seconds = u32;
// SQLite file backing the reporting endpoint
pub type SqlFile = String;
