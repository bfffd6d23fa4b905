use serde::{Deserialize, Deserializer};
use std::io::Read;

/// Loosely-typed spreadsheet row as exported by the scheduling tools.
/// Column names vary by export (English/Spanish, camel/space separated), so
/// every field tolerates the known aliases and absence.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAssignmentRow {
    #[serde(
        rename = "Cliente",
        alias = "client",
        alias = "Client",
        alias = "clientName",
        alias = "client_name",
        default
    )]
    pub client_name: String,
    #[serde(
        rename = "clienteId",
        alias = "clientId",
        alias = "client_id",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub client_id: Option<String>,
    #[serde(
        rename = "Terapeuta",
        alias = "therapist",
        alias = "Therapist",
        alias = "therapistName",
        alias = "therapist_name",
        default
    )]
    pub therapist_name: String,
    #[serde(
        rename = "terapeutaId",
        alias = "therapistId",
        alias = "therapist_id",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub therapist_id: Option<String>,
    #[serde(
        rename = "Precio",
        alias = "price",
        alias = "clientPrice",
        alias = "client_price",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub client_price: Option<String>,
    #[serde(
        rename = "Pago",
        alias = "pay",
        alias = "therapistPay",
        alias = "therapist_pay",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub therapist_pay: Option<String>,
    #[serde(
        rename = "Terapeuta2",
        alias = "secondaryTherapist",
        alias = "secondary_therapist",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub secondary_therapist_name: Option<String>,
    #[serde(
        rename = "Pago2",
        alias = "secondaryPay",
        alias = "secondary_pay",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub secondary_therapist_pay: Option<String>,
    #[serde(
        rename = "Horario",
        alias = "schedule",
        alias = "scheduleType",
        alias = "schedule_type",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub schedule_type: Option<String>,
}

/// Read every row, keeping per-row csv failures so one malformed line never
/// aborts the batch.
pub(crate) fn read_rows<R: Read>(reader: R) -> Vec<Result<RawAssignmentRow, csv::Error>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    csv_reader.deserialize::<RawAssignmentRow>().collect()
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
