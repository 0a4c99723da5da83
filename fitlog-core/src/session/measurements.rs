use crate::dates::{day_of, measurement_timestamp};
use crate::db::models::Measurement;
use crate::db::operations::{
    delete_measurements_on, get_all_measurements, insert_measurement,
};
use crate::session::Session;
use anyhow::{Result, anyhow};
use log::{debug, info};
use serde::Serialize;

/// Every sample taken on one calendar day, latest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementDay {
    pub date: String,
    pub samples: Vec<Measurement>,
}

impl MeasurementDay {
    /// Latest value of `kind` that day.
    pub fn value_of(&self, kind: &str) -> Option<f64> {
        self.samples.iter().find(|m| m.kind == kind).map(|m| m.value)
    }
}

impl Session {
    /// Record one sample. `when` may be a `YYYY-MM-DD` date (the current time
    /// of day is added), a full timestamp, or `None` for now.
    pub async fn add_measurement(
        &self,
        kind: &str,
        value: f64,
        unit: Option<&str>,
        when: Option<&str>,
    ) -> Result<i64> {
        if kind.trim().is_empty() {
            return Err(anyhow!("Measurement type must not be empty"));
        }
        if !value.is_finite() {
            return Err(anyhow!("Measurement value must be a number"));
        }
        let timestamp = measurement_timestamp(when)?;
        let unit = unit.filter(|u| !u.is_empty()).unwrap_or("kg");

        let _writer = self.writer().await;
        let mut conn = self.conn().await?;
        let id = insert_measurement(&mut conn, kind, value, unit, &timestamp).await?;
        debug!("Recorded {} = {}{} at {}", kind, value, unit, timestamp);
        Ok(id)
    }

    /// All samples grouped per calendar day, newest day first.
    pub async fn measurement_history(&self) -> Result<Vec<MeasurementDay>> {
        let mut conn = self.conn().await?;
        let samples = get_all_measurements(&mut conn).await?;

        let mut days: Vec<MeasurementDay> = Vec::new();
        for sample in samples {
            let date = day_of(&sample.date).to_string();
            match days.last_mut() {
                Some(day) if day.date == date => day.samples.push(sample),
                _ => days.push(MeasurementDay {
                    date,
                    samples: vec![sample],
                }),
            }
        }
        Ok(days)
    }

    /// Calendar day of the most recent sample of any type.
    pub async fn last_measurement_date(&self) -> Result<Option<String>> {
        let mut conn = self.conn().await?;
        let latest: Option<String> =
            sqlx::query_scalar("SELECT date FROM measurements ORDER BY date DESC, id DESC LIMIT 1")
                .fetch_optional(&mut *conn)
                .await?;
        Ok(latest.map(|ts| day_of(&ts).to_string()))
    }

    /// Remove every sample taken on `date`. Returns the number removed.
    pub async fn delete_measurements_on(&self, date: &str) -> Result<u64> {
        let _writer = self.writer().await;
        let mut conn = self.conn().await?;
        let removed = delete_measurements_on(&mut conn, date).await?;
        info!("Deleted {} measurements for {}", removed, date);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn samples_group_by_day() {
        let session = Session::in_memory().await.unwrap();
        session
            .add_measurement("weight", 80.0, None, Some("2024-01-01T08:00:00"))
            .await
            .unwrap();
        session
            .add_measurement("arm", 35.0, Some("cm"), Some("2024-01-01T08:05:00"))
            .await
            .unwrap();
        session
            .add_measurement("weight", 79.5, None, Some("2024-01-03T07:30:00"))
            .await
            .unwrap();

        let days = session.measurement_history().await.unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, "2024-01-03");
        assert_eq!(days[1].samples.len(), 2);
        assert_eq!(days[1].value_of("arm"), Some(35.0));
        assert_eq!(days[1].samples[1].unit.as_deref(), Some("kg"));

        assert_eq!(
            session.last_measurement_date().await.unwrap().as_deref(),
            Some("2024-01-03")
        );
    }

    #[tokio::test]
    async fn bare_date_gets_time_of_day() {
        let session = Session::in_memory().await.unwrap();
        session
            .add_measurement("chest", 100.0, Some("cm"), Some("2024-02-10"))
            .await
            .unwrap();
        let days = session.measurement_history().await.unwrap();
        let stamp = &days[0].samples[0].date;
        assert!(stamp.starts_with("2024-02-10T"));
        assert_eq!(stamp.len(), 19);
    }

    #[tokio::test]
    async fn invalid_input_is_rejected() {
        let session = Session::in_memory().await.unwrap();
        assert!(session.add_measurement("", 1.0, None, None).await.is_err());
        assert!(session.add_measurement("weight", f64::NAN, None, None).await.is_err());
        assert!(session
            .add_measurement("weight", 80.0, None, Some("yesterday"))
            .await
            .is_err());
        assert!(session.last_measurement_date().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_by_day() {
        let session = Session::in_memory().await.unwrap();
        session
            .add_measurement("weight", 80.0, None, Some("2024-01-01T08:00:00"))
            .await
            .unwrap();
        session
            .add_measurement("weight", 81.0, None, Some("2024-01-02T08:00:00"))
            .await
            .unwrap();

        assert_eq!(session.delete_measurements_on("2024-01-01").await.unwrap(), 1);
        let days = session.measurement_history().await.unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].date, "2024-01-02");
    }
}
