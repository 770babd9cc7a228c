//! NS travel information client
//!
//! Thin client for the NS (Nederlandse Spoorwegen) travel information API:
//! disruption listings per station and journey advice between two stations.
//! Replies are pre-formatted here as the Dutch one-liners the bot sends out.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::application::errors::NsError;
use crate::infrastructure::config::NsConfig;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Storingen {
    #[serde(default)]
    pub gepland: Vec<GeplandeStoring>,
    #[serde(default)]
    pub ongepland: Vec<OngeplandeStoring>,
}

/// Planned engineering works
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GeplandeStoring {
    pub periode: String,
    pub traject: String,
}

/// Unplanned disruption
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OngeplandeStoring {
    pub bericht: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Reismogelijkheden {
    #[serde(default)]
    pub reismogelijkheid: Vec<Reismogelijkheid>,
}

/// One journey option between two stations
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Reismogelijkheid {
    pub geplande_vertrek_tijd: String,
    pub geplande_aankomst_tijd: String,
    pub aantal_overstappen: u32,
}

/// NS API client
pub struct NsClient {
    client: Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl NsClient {
    pub fn new(config: &NsConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, NsError> {
        let url = format!("{}/{}", self.base_url, path);
        let mut request = self.client.get(&url).query(query);
        if let Some(ref username) = self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(NsError::Status(response.status()));
        }

        Ok(response.json().await?)
    }

    /// Current disruptions around a station, planned works first.
    pub async fn storingen(&self, station: &str) -> Result<Vec<String>, NsError> {
        let storingen: Storingen = self
            .get_json("ns-api-storingen", &[("station", station)])
            .await?;

        Ok(storingen
            .gepland
            .iter()
            .map(gepland_to_string)
            .chain(storingen.ongepland.iter().map(ongepland_to_string))
            .collect())
    }

    /// Journey options between two stations, one reply line per option.
    pub async fn reisadvies(&self, from: &str, to: &str) -> Result<Vec<String>, NsError> {
        let advies: Reismogelijkheden = self
            .get_json(
                "ns-api-treinplanner",
                &[("fromStation", from), ("toStation", to)],
            )
            .await?;

        Ok(advies
            .reismogelijkheid
            .iter()
            .map(reismogelijkheid_to_string)
            .collect())
    }
}

fn gepland_to_string(storing: &GeplandeStoring) -> String {
    format!(
        "Geplande werkzaamheden {} op traject {}",
        storing.periode, storing.traject
    )
}

fn ongepland_to_string(storing: &OngeplandeStoring) -> String {
    storing.bericht.replace('\r', "\n")
}

fn reismogelijkheid_to_string(reis: &Reismogelijkheid) -> String {
    format!(
        "Vertrek {} - aankomst {} ({} overstappen)",
        tijd(&reis.geplande_vertrek_tijd),
        tijd(&reis.geplande_aankomst_tijd),
        reis.aantal_overstappen
    )
}

/// Render an API timestamp as HH:MM, leaving unparseable values as-is.
fn tijd(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}
