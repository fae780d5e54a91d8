//! First-start data: roles, the `admin` account, appointment statuses and an
//! optional handful of demo patients.

use anyhow::Context;
use chrono::{Days, NaiveDate, NaiveTime};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    auth::hash_password,
    config::SeedConfig,
    models::{
        Appointment, AppointmentStatus, Patient, ROLE_ADMINISTRATOR, ROLE_DOCTOR,
        ROLE_RECEPTIONIST, STATUS_CANCELLED, STATUS_COMPLETED, STATUS_CONFIRMED, STATUS_NO_SHOW,
        STATUS_PENDING,
    },
    store::Store,
};

const ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

const ROLES: [&str; 3] = [ROLE_ADMINISTRATOR, ROLE_RECEPTIONIST, ROLE_DOCTOR];

const STATUSES: [&str; 5] = [
    STATUS_PENDING,
    STATUS_CONFIRMED,
    STATUS_COMPLETED,
    STATUS_CANCELLED,
    STATUS_NO_SHOW,
];

pub async fn run(
    pool: &PgPool,
    store: &dyn Store,
    cfg: &SeedConfig,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let role_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM role")
        .fetch_one(pool)
        .await
        .context("counting roles")?;

    if role_count > 0 {
        // Existing install; only backfill statuses if someone emptied that table.
        seed_statuses(store).await?;
        tracing::info!("database already seeded");
        return Ok(());
    }

    let admin_role_id = seed_roles(pool).await?;
    seed_admin(pool, admin_role_id, &cfg.admin_password).await?;
    seed_statuses(store).await?;

    if cfg.demo_data {
        seed_demo_data(store, today).await?;
    }

    Ok(())
}

/// Inserts the fixed role set; returns the Administrator role id.
async fn seed_roles(pool: &PgPool) -> anyhow::Result<Uuid> {
    let mut admin_role_id = None;

    for name in ROLES {
        let role_id = Uuid::new_v4();
        sqlx::query("INSERT INTO role (role_id, name) VALUES ($1, $2)")
            .bind(role_id)
            .bind(name)
            .execute(pool)
            .await
            .with_context(|| format!("inserting role {name}"))?;

        if name == ROLE_ADMINISTRATOR {
            admin_role_id = Some(role_id);
        }
    }

    tracing::info!(count = ROLES.len(), "roles created");
    admin_role_id.context("administrator role missing from seed set")
}

async fn seed_admin(pool: &PgPool, role_id: Uuid, password: &str) -> anyhow::Result<()> {
    if password == DEFAULT_ADMIN_PASSWORD {
        tracing::warn!(
            username = ADMIN_USERNAME,
            "seeding admin with the default password; set SEED_ADMIN_PASSWORD and change it after first login"
        );
    }

    let pw_hash = hash_password(password).map_err(anyhow::Error::msg)?;

    sqlx::query(
        r#"
        INSERT INTO app_user (user_id, username, password_hash, role_id)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(ADMIN_USERNAME)
    .bind(&pw_hash)
    .bind(role_id)
    .execute(pool)
    .await
    .context("inserting admin user")?;

    tracing::info!(username = ADMIN_USERNAME, "admin user created");
    Ok(())
}

/// Inserts the five workflow statuses when none exist. Returns how many were added.
pub async fn seed_statuses(store: &dyn Store) -> anyhow::Result<usize> {
    if !store.list_statuses().await?.is_empty() {
        return Ok(0);
    }

    for name in STATUSES {
        store
            .insert_status(&AppointmentStatus {
                status_id: Uuid::new_v4(),
                name: name.to_string(),
            })
            .await?;
    }

    tracing::info!(count = STATUSES.len(), "appointment statuses created");
    Ok(STATUSES.len())
}

fn demo_patient(name: &str, phone: &str, address: &str, birth: (i32, u32, u32)) -> Patient {
    Patient {
        patient_id: Uuid::new_v4(),
        name: name.to_string(),
        phone: Some(phone.to_string()),
        address: Some(address.to_string()),
        birth_date: NaiveDate::from_ymd_opt(birth.0, birth.1, birth.2),
    }
}

/// Three patients plus two Pending bookings: tomorrow 09:00 and the day after at 10:30.
pub async fn seed_demo_data(store: &dyn Store, today: NaiveDate) -> anyhow::Result<()> {
    let patients = [
        demo_patient("Juan Perez", "3001234567", "Calle 123 #45-67", (1990, 5, 15)),
        demo_patient("Maria Garcia", "3002345678", "Avenida Principal #12-34", (1985, 8, 20)),
        demo_patient("Carlos Rodriguez", "3003456789", "Carrera 56 #78-90", (1992, 3, 10)),
    ];

    for patient in &patients {
        store.insert_patient(patient).await?;
    }
    tracing::info!(count = patients.len(), "demo patients created");

    let Some(pending) = store.find_status_by_name(STATUS_PENDING).await? else {
        tracing::warn!("no Pending status; skipping demo appointments");
        return Ok(());
    };

    let bookings = [
        (&patients[0], 1, (9, 0), "First visit"),
        (&patients[1], 2, (10, 30), "Follow-up"),
    ];

    for (patient, days_ahead, (h, m), note) in bookings {
        let date = today
            .checked_add_days(Days::new(days_ahead))
            .context("demo appointment date out of range")?;
        let time = NaiveTime::from_hms_opt(h, m, 0).context("demo appointment time")?;

        store
            .insert_appointment(&Appointment {
                appointment_id: Uuid::new_v4(),
                patient_id: patient.patient_id,
                scheduled_at: date.and_time(time),
                status_id: pending.status_id,
                note: Some(note.to_string()),
            })
            .await?;
    }
    tracing::info!(count = bookings.len(), "demo appointments created");

    Ok(())
}
