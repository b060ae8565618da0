use serde::Serialize;

use super::{Course, ResourceClient, Student, Teacher};
use crate::core::api::{ApiClient, HttpTransport};
use crate::core::auth::{Role, SessionStore};

/// Collection sizes shown on the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub students: usize,
    pub teachers: usize,
    pub courses: usize,
}

impl DashboardStats {
    /// Staff get all three counts, fetched concurrently. Students get zeros.
    /// If any fetch fails every count stays zero.
    pub async fn load<S, T>(api: &ApiClient<S, T>, role: Role) -> Self
    where
        S: SessionStore,
        T: HttpTransport,
    {
        if !role.is_staff() {
            return Self::default();
        }

        let students = ResourceClient::<Student, S, T>::new(api.clone());
        let teachers = ResourceClient::<Teacher, S, T>::new(api.clone());
        let courses = ResourceClient::<Course, S, T>::new(api.clone());

        let (students, teachers, courses) =
            tokio::join!(students.list(), teachers.list(), courses.list());

        match (students, teachers, courses) {
            (Ok(students), Ok(teachers), Ok(courses)) => Self {
                students: students.len(),
                teachers: teachers.len(),
                courses: courses.len(),
            },
            (students, teachers, courses) => {
                let error = [students.err(), teachers.err(), courses.err()]
                    .into_iter()
                    .flatten()
                    .next();
                if let Some(error) = error {
                    tracing::debug!("Dashboard stats unavailable: {}", error);
                }
                Self::default()
            }
        }
    }
}
