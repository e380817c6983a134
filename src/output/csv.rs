use anyhow::Result;

use crate::snapshot::Snapshot;

pub fn snapshot_to_csv(snapshot: &Snapshot) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["subject", "classes_attended", "classes_held", "percentage"])?;
    for record in &snapshot.subjects {
        writer.write_record([
            record.subject.clone(),
            record.classes_attended.to_string(),
            record.classes_held.to_string(),
            record.percentage.to_string(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}
