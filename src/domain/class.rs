use super::record::{Record, merge};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A class taught at the school. `teacher_id` is informational and may
/// point at a teacher that no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub teacher_id: String,
    #[serde(default)]
    pub schedule: String,
    #[serde(default)]
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClass {
    pub name: String,
    pub subject: String,
    pub teacher_id: String,
    pub schedule: String,
    pub room: String,
}

impl NewClass {
    pub fn into_class(self, id: String) -> Class {
        Class {
            id,
            name: self.name,
            subject: self.subject,
            teacher_id: self.teacher_id,
            schedule: self.schedule,
            room: self.room,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassPatch {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub teacher_id: Option<String>,
    pub schedule: Option<String>,
    pub room: Option<String>,
}

impl Record for Class {
    const KEY: &'static str = "classes";
    type Patch = ClassPatch;

    fn id(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.id)
    }

    fn apply(&mut self, patch: ClassPatch) {
        merge(&mut self.name, patch.name);
        merge(&mut self.subject, patch.subject);
        merge(&mut self.teacher_id, patch.teacher_id);
        merge(&mut self.schedule, patch.schedule);
        merge(&mut self.room, patch.room);
    }

    fn seed() -> Vec<Self> {
        [
            (
                "1",
                "Grade 10 Calculus",
                "Advanced Mathematics",
                "1",
                "Mon, Wed 10:00-11:30",
                "Room 101",
            ),
            (
                "2",
                "Grade 12 Physics",
                "Physics & Astrophysics",
                "2",
                "Tue, Thu 13:00-14:30",
                "Room 202",
            ),
            (
                "3",
                "Grade 10 English",
                "English Literature",
                "3",
                "Mon, Fri 09:00-10:30",
                "Room 303",
            ),
        ]
        .into_iter()
        .map(|(id, name, subject, teacher_id, schedule, room)| Class {
            id: id.to_string(),
            name: name.to_string(),
            subject: subject.to_string(),
            teacher_id: teacher_id.to_string(),
            schedule: schedule.to_string(),
            room: room.to_string(),
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reassign_teacher() {
        let mut class = Class::seed().remove(0);
        class.apply(ClassPatch {
            teacher_id: Some("2".to_string()),
            room: Some("Lab B".to_string()),
            ..Default::default()
        });
        assert_eq!(class.teacher_id, "2");
        assert_eq!(class.room, "Lab B");
        assert_eq!(class.name, "Grade 10 Calculus");
    }

    #[test]
    fn test_deserialize_tolerates_missing_optional_fields() {
        let class: Class = serde_json::from_str(r#"{"id":"9","name":"Choir"}"#).unwrap();
        assert_eq!(class.teacher_id, "");
        assert_eq!(class.room, "");
    }
}
