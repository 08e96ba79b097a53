// libs/auth-cell/src/services/seed.rs
use tracing::{info, warn};

use shared_database::{ClinicStore, StoreError};
use shared_models::clinic::NewDoctor;

use crate::models::AuthError;
use crate::services::password::hash_password;

struct SampleDoctor {
    username: &'static str,
    full_name: &'static str,
    phone: &'static str,
    specialization: &'static str,
    qualification: &'static str,
    experience_years: i32,
}

const SAMPLE_DOCTORS: [SampleDoctor; 4] = [
    SampleDoctor {
        username: "dr.sarah",
        full_name: "Dr. Sarah Johnson",
        phone: "555-0101",
        specialization: "Diabetologist",
        qualification: "MD, Endocrinology",
        experience_years: 10,
    },
    SampleDoctor {
        username: "dr.michael",
        full_name: "Dr. Michael Chen",
        phone: "555-0102",
        specialization: "Cardiologist",
        qualification: "MD, Cardiology",
        experience_years: 15,
    },
    SampleDoctor {
        username: "dr.emily",
        full_name: "Dr. Emily Davis",
        phone: "555-0103",
        specialization: "Hepatologist",
        qualification: "MD, Gastroenterology",
        experience_years: 12,
    },
    SampleDoctor {
        username: "dr.robert",
        full_name: "Dr. Robert Williams",
        phone: "555-0104",
        specialization: "Nephrologist",
        qualification: "MD, Nephrology",
        experience_years: 8,
    },
];

/// Insert the sample doctors when the doctor table is empty. Returns how many were added.
pub async fn seed_sample_doctors(
    store: &dyn ClinicStore,
    password: &str,
) -> Result<usize, AuthError> {
    let existing = store
        .list_doctors()
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;
    if !existing.is_empty() {
        info!("{} doctors already present, skipping seed", existing.len());
        return Ok(0);
    }

    let password_hash = hash_password(password)?;
    let mut inserted = 0;

    for sample in &SAMPLE_DOCTORS {
        let result = store
            .insert_doctor(NewDoctor {
                username: sample.username.to_string(),
                email: format!("{}@hospital.com", sample.username),
                password_hash: password_hash.clone(),
                full_name: sample.full_name.to_string(),
                phone: Some(sample.phone.to_string()),
                specialization: sample.specialization.to_string(),
                qualification: Some(sample.qualification.to_string()),
                experience_years: Some(sample.experience_years),
            })
            .await;

        match result {
            Ok(_) => inserted += 1,
            // Another instance seeded concurrently.
            Err(StoreError::UniqueViolation(_)) => {
                warn!("Sample doctor {} already exists", sample.username)
            }
            Err(e) => return Err(AuthError::DatabaseError(e.to_string())),
        }
    }

    info!("Seeded {} sample doctors", inserted);
    Ok(inserted)
}
