use std::{
    collections::BTreeSet,
    fmt,
    time::Duration,
};

use base64::{
    Engine,
    engine::general_purpose::STANDARD as BASE64,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use serde::{
    Deserialize,
    Serialize,
    de::DeserializeOwned,
};

use crate::{
    bet::{
        Bet,
        BetDraft,
        BetId,
    },
    service::{
        Ack,
        CoefficientRange,
        DataService,
        ExportFile,
        Filters,
        MonthFilter,
        Overview,
        Rejection,
        Reply,
        Stats,
    },
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Data service reached over HTTP: every operation is a JSON `POST` to
/// `{base_url}/rpc/{method}`.
#[derive(Clone)]
pub struct HttpDataService {
    base_url: String,
    http: reqwest::Client,
}

impl HttpDataService {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .wrap_err("failed to build HTTP client for data service")?;
        Ok(Self { base_url, http })
    }

    async fn call<B, R>(&self, method: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/rpc/{}", self.base_url, method);
        let res = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .wrap_err("data service request failed")?;
        let status = res.status();
        let bytes = res
            .bytes()
            .await
            .wrap_err("failed to read data service response body")?;
        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes);
            return Err(eyre!(
                "data service responded with {status} to {method}: {body}"
            ));
        }
        serde_json::from_slice(&bytes)
            .wrap_err_with(|| format!("invalid data service payload for {method}"))
    }

    async fn ack<B: Serialize + ?Sized>(&self, method: &str, body: &B) -> Result<Ack> {
        let dto: AckDto = self.call(method, body).await?;
        Ok(dto.into())
    }
}

impl DataService for HttpDataService {
    async fn query(&self, filters: &Filters) -> Result<Overview> {
        let dto: OverviewDto = self.call("query", &QueryDto::from(filters)).await?;
        dto.try_into()
    }

    async fn get_bet(&self, id: BetId) -> Result<Reply<Bet>> {
        let dto: BetReplyDto = self.call("get_bet", &IdDto { id }).await?;
        dto.try_into()
    }

    async fn create_bet(&self, draft: &BetDraft) -> Result<Ack> {
        self.ack("create_bet", draft).await
    }

    async fn update_bet(&self, id: BetId, draft: &BetDraft) -> Result<Ack> {
        self.ack("update_bet", &UpdateDto { id, bet: draft }).await
    }

    async fn delete_bet(&self, id: BetId) -> Result<Ack> {
        self.ack("delete_bet", &IdDto { id }).await
    }

    async fn export(&self) -> Result<Reply<ExportFile>> {
        let dto: ExportDto = self.call("export", &Empty {}).await?;
        dto.try_into()
    }

    async fn import(&self, file: &[u8]) -> Result<Ack> {
        let body = ImportDto {
            data: BASE64.encode(file),
        };
        self.ack("import", &body).await
    }

    async fn shutdown(&self) -> Result<()> {
        let _: serde_json::Value = self.call("shutdown", &Empty {}).await?;
        Ok(())
    }
}

impl fmt::Display for HttpDataService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_url)
    }
}

#[derive(Serialize)]
struct Empty {}

#[derive(Serialize)]
struct IdDto {
    id: BetId,
}

#[derive(Serialize)]
struct UpdateDto<'a> {
    id: BetId,
    #[serde(flatten)]
    bet: &'a BetDraft,
}

#[derive(Serialize)]
struct ImportDto {
    data: String,
}

#[derive(Debug, PartialEq, Serialize)]
struct QueryDto<'a> {
    month: Option<String>,
    source: Option<&'a str>,
    coefficient_range: Option<CoefficientRange>,
}

impl<'a> From<&'a Filters> for QueryDto<'a> {
    fn from(filters: &'a Filters) -> Self {
        Self {
            month: match filters.month {
                MonthFilter::All => None,
                MonthFilter::Month(m) => Some(m.to_string()),
            },
            source: filters.source.as_query(),
            coefficient_range: filters.coefficient,
        }
    }
}

#[derive(Deserialize)]
struct OverviewDto {
    #[serde(default)]
    stats: Stats,
    #[serde(default)]
    chart_image: Option<String>,
    #[serde(default)]
    bets: Vec<Bet>,
    #[serde(default)]
    sources: Vec<String>,
}

#[derive(Deserialize)]
struct AckDto {
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct BetReplyDto {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    bet: Option<Bet>,
}

#[derive(Deserialize)]
struct ExportDto {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    data: Option<String>,
}

const DEFAULT_EXPORT_FILENAME: &str = "bet_history.xlsx";

fn rejection(message: Option<String>) -> Rejection {
    Rejection(message.unwrap_or_else(|| "Operation failed".to_string()))
}

impl From<AckDto> for Ack {
    fn from(dto: AckDto) -> Self {
        if dto.success {
            Ok(dto.message)
        } else {
            Err(rejection(dto.message))
        }
    }
}

impl TryFrom<OverviewDto> for Overview {
    type Error = color_eyre::Report;

    fn try_from(dto: OverviewDto) -> Result<Self> {
        let chart = match dto.chart_image.filter(|c| !c.is_empty()) {
            Some(encoded) => Some(
                BASE64
                    .decode(encoded)
                    .wrap_err("chart image is not valid base64")?,
            ),
            None => None,
        };
        Ok(Overview {
            stats: dto.stats,
            chart,
            bets: dto.bets,
            sources: dto.sources.into_iter().collect::<BTreeSet<_>>(),
        })
    }
}

impl TryFrom<BetReplyDto> for Reply<Bet> {
    type Error = color_eyre::Report;

    fn try_from(dto: BetReplyDto) -> Result<Self> {
        if !dto.success {
            return Ok(Err(rejection(dto.message)));
        }
        dto.bet
            .map(Ok)
            .ok_or_else(|| eyre!("data service reported success without a bet"))
    }
}

impl TryFrom<ExportDto> for Reply<ExportFile> {
    type Error = color_eyre::Report;

    fn try_from(dto: ExportDto) -> Result<Self> {
        if !dto.success {
            return Ok(Err(rejection(dto.message)));
        }
        let encoded = dto
            .data
            .ok_or_else(|| eyre!("data service reported success without export data"))?;
        let bytes = BASE64
            .decode(encoded)
            .wrap_err("export data is not valid base64")?;
        Ok(Ok(ExportFile {
            filename: dto
                .filename
                .unwrap_or_else(|| DEFAULT_EXPORT_FILENAME.to_string()),
            bytes,
        }))
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::{
        bet::{
            BetResult,
            LedgerDate,
            Month,
        },
        service::SourceFilter,
    };
    use serde_json::json;

    #[test]
    fn query_dto__unfiltered_sends_nulls() {
        // given
        let filters = Filters::default();

        // when
        let body = serde_json::to_value(QueryDto::from(&filters)).unwrap();

        // then
        assert_eq!(
            body,
            json!({"month": null, "source": null, "coefficient_range": null})
        );
    }

    #[test]
    fn query_dto__carries_all_filters() {
        // given
        let filters = Filters {
            month: MonthFilter::Month(Month(3)),
            source: SourceFilter::Unspecified,
            coefficient: Some(CoefficientRange { min: 1.5, max: 2.0 }),
        };

        // when
        let body = serde_json::to_value(QueryDto::from(&filters)).unwrap();

        // then
        assert_eq!(
            body,
            json!({
                "month": "03",
                "source": "unspecified",
                "coefficient_range": {"min": 1.5, "max": 2.0}
            })
        );
    }

    #[test]
    fn update_dto__flattens_draft_next_to_id() {
        // given
        let draft = BetDraft {
            date: LedgerDate {
                day: 1,
                month: 2,
                year: 2025,
            },
            event: "A - B".to_string(),
            coefficient: 1.8,
            stake: 20.0,
            result: BetResult::Pending,
            source: "Forum".to_string(),
        };

        // when
        let body = serde_json::to_value(UpdateDto {
            id: BetId(4),
            bet: &draft,
        })
        .unwrap();

        // then
        assert_eq!(
            body,
            json!({
                "id": 4,
                "date": "01.02.2025",
                "event": "A - B",
                "coefficient": 1.8,
                "stake": 20.0,
                "result": "pending",
                "source": "Forum"
            })
        );
    }

    #[test]
    fn overview__decodes_chart_and_sources() {
        // given
        let dto: OverviewDto = serde_json::from_value(json!({
            "stats": {"total_bets": 1, "won_bets": 1},
            "chart_image": BASE64.encode([1u8, 2, 3]),
            "bets": [{
                "id": 1, "date": "2025-07-17", "event": "A - B",
                "coefficient": 2.0, "stake": 10.0, "result": "win", "source": "Forum"
            }],
            "sources": ["Forum", "Friend", "Forum"]
        }))
        .unwrap();

        // when
        let overview = Overview::try_from(dto).unwrap();

        // then
        assert_eq!(overview.chart, Some(vec![1, 2, 3]));
        assert_eq!(overview.bets.len(), 1);
        assert_eq!(overview.sources.len(), 2);
        assert_eq!(overview.stats.total_bets, 1);
    }

    #[test]
    fn overview__empty_chart_is_absent() {
        let dto: OverviewDto =
            serde_json::from_value(json!({"chart_image": "", "bets": []})).unwrap();
        assert_eq!(Overview::try_from(dto).unwrap().chart, None);
    }

    #[test]
    fn overview__broken_chart_is_transport_error() {
        let dto: OverviewDto =
            serde_json::from_value(json!({"chart_image": "!!!"})).unwrap();
        assert!(Overview::try_from(dto).is_err());
    }

    #[test]
    fn ack__failure_carries_message() {
        // given
        let dto: AckDto = serde_json::from_value(json!({
            "success": false,
            "message": "Invalid date"
        }))
        .unwrap();

        // when
        let ack: Ack = dto.into();

        // then
        assert_eq!(ack, Err(Rejection("Invalid date".to_string())));
    }

    #[test]
    fn ack__failure_without_message_gets_generic_text() {
        let dto: AckDto = serde_json::from_value(json!({"success": false})).unwrap();
        let ack: Ack = dto.into();
        assert_eq!(ack, Err(Rejection("Operation failed".to_string())));
    }

    #[test]
    fn bet_reply__success_without_bet_is_transport_error() {
        let dto: BetReplyDto = serde_json::from_value(json!({"success": true})).unwrap();
        assert!(Reply::<Bet>::try_from(dto).is_err());
    }

    #[test]
    fn export__decodes_file() {
        // given
        let dto: ExportDto = serde_json::from_value(json!({
            "success": true,
            "data": BASE64.encode(b"xlsx"),
        }))
        .unwrap();

        // when
        let file = Reply::<ExportFile>::try_from(dto).unwrap().unwrap();

        // then
        assert_eq!(file.filename, DEFAULT_EXPORT_FILENAME);
        assert_eq!(file.bytes, b"xlsx".to_vec());
    }
}
