use super::record::{Record, merge};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A teacher employed by the school.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub subject: String,
    pub join_date: NaiveDate,
    /// Data URI or external URL.
    #[serde(default)]
    pub profile_image: String,
}

/// Teacher fields supplied at creation time; the registry assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTeacher {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub subject: String,
    pub join_date: NaiveDate,
    pub profile_image: String,
}

impl NewTeacher {
    pub fn into_teacher(self, id: String) -> Teacher {
        Teacher {
            id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            subject: self.subject,
            join_date: self.join_date,
            profile_image: self.profile_image,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeacherPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub join_date: Option<NaiveDate>,
    pub profile_image: Option<String>,
}

impl Record for Teacher {
    const KEY: &'static str = "teachers";
    type Patch = TeacherPatch;

    fn id(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.id)
    }

    fn apply(&mut self, patch: TeacherPatch) {
        merge(&mut self.name, patch.name);
        merge(&mut self.email, patch.email);
        merge(&mut self.phone, patch.phone);
        merge(&mut self.subject, patch.subject);
        merge(&mut self.join_date, patch.join_date);
        merge(&mut self.profile_image, patch.profile_image);
    }

    fn seed() -> Vec<Self> {
        vec![
            seed_teacher(
                "1",
                "Dr. Sarah Johnson",
                "sarah.math@school.edu",
                "+1 (555) 123-4567",
                "Advanced Mathematics",
                (2022, 3, 15),
                "https://images.unsplash.com/photo-1573496359142-b8d87734a5a2?w=300",
            ),
            seed_teacher(
                "2",
                "Prof. Michael Chen",
                "michael.physics@school.edu",
                "+1 (555) 234-5678",
                "Physics & Astrophysics",
                (2021, 8, 22),
                "https://images.unsplash.com/photo-1560250097-0b93528c311a?w=300",
            ),
            seed_teacher(
                "3",
                "Ms. Emily Wilson",
                "emily.english@school.edu",
                "+1 (555) 345-6789",
                "English Literature",
                (2023, 1, 10),
                "https://images.unsplash.com/photo-1544005313-94ddf0286df2?w=300",
            ),
        ]
    }
}

fn seed_teacher(
    id: &str,
    name: &str,
    email: &str,
    phone: &str,
    subject: &str,
    (y, m, d): (i32, u32, u32),
    profile_image: &str,
) -> Teacher {
    Teacher {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        subject: subject.to_string(),
        join_date: NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default(),
        profile_image: profile_image.to_string(),
    }
}
