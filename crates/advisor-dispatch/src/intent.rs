//! Request intents and the keyword classifier.

use serde::{Deserialize, Serialize};

use crate::DispatchError;

/// What a request is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Research,
    Strategy,
    RiskAssessment,
    Portfolio,
    Monitoring,
    Education,
    Trade,
    Rebalance,
    General,
}

/// Keyword sets checked in order; the first hit wins.
const KEYWORDS: &[(Intent, &[&str])] = &[
    (Intent::Rebalance, &["rebalance", "rebalancing", "reallocate", "리밸런싱", "비중조절", "비중 조절"]),
    (Intent::Trade, &["buy", "sell", "purchase", "order", "매수", "매도", "주문"]),
    (Intent::RiskAssessment, &["risk", "var", "volatility", "beta", "drawdown", "리스크", "위험", "변동성"]),
    (Intent::Portfolio, &["portfolio", "holdings", "positions", "allocation", "포트폴리오", "보유", "잔고"]),
    (Intent::Strategy, &["strategy", "plan", "recommend", "전략", "추천"]),
    (Intent::Monitoring, &["alert", "monitor", "watch", "notify", "알림", "모니터링", "감시"]),
    (Intent::Education, &["explain", "what is", "meaning", "learn", "설명", "뜻", "의미"]),
    (Intent::Research, &["research", "analysis", "analyze", "outlook", "news", "earnings", "분석", "전망", "뉴스", "실적"]),
];

impl Intent {
    pub const ALL: [Intent; 9] = [
        Intent::Research,
        Intent::Strategy,
        Intent::RiskAssessment,
        Intent::Portfolio,
        Intent::Monitoring,
        Intent::Education,
        Intent::Trade,
        Intent::Rebalance,
        Intent::General,
    ];

    /// Classify a request by keyword.
    ///
    /// ASCII keywords match whole words (or word sequences); other keywords
    /// match as substrings.
    pub fn classify_keywords(request: &str) -> Intent {
        let lowered = request.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let normalized = format!(" {} ", words.join(" "));

        KEYWORDS
            .iter()
            .find(|(_, keywords)| {
                keywords.iter().any(|k| {
                    if k.is_ascii() {
                        normalized.contains(&format!(" {k} "))
                    } else {
                        lowered.contains(*k)
                    }
                })
            })
            .map(|(intent, _)| *intent)
            .unwrap_or(Intent::General)
    }

    /// Whether this intent can lead to a trade.
    pub fn is_transactional(&self) -> bool {
        matches!(self, Intent::Trade | Intent::Rebalance)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Research => "research",
            Intent::Strategy => "strategy",
            Intent::RiskAssessment => "risk_assessment",
            Intent::Portfolio => "portfolio",
            Intent::Monitoring => "monitoring",
            Intent::Education => "education",
            Intent::Trade => "trade",
            Intent::Rebalance => "rebalance",
            Intent::General => "general",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Intent {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase().replace('-', "_");
        Intent::ALL
            .into_iter()
            .find(|i| i.as_str() == name)
            .ok_or_else(|| DispatchError::UnknownIntent(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_keywords() {
        assert_eq!(Intent::classify_keywords("Buy 100 shares of 005930"), Intent::Trade);
        assert_eq!(Intent::classify_keywords("삼성전자 100주 매수해줘"), Intent::Trade);
        assert_eq!(Intent::classify_keywords("Please rebalance my portfolio"), Intent::Rebalance);
        assert_eq!(Intent::classify_keywords("How risky is my portfolio?"), Intent::Portfolio);
        assert_eq!(Intent::classify_keywords("What's the VaR right now"), Intent::RiskAssessment);
        assert_eq!(Intent::classify_keywords("explain what a P/E ratio is"), Intent::Education);
        assert_eq!(Intent::classify_keywords("earnings outlook for chips"), Intent::Research);
        assert_eq!(Intent::classify_keywords("hello"), Intent::General);
    }

    #[test]
    fn test_whole_word_match() {
        // "bestseller" must not read as "sell", nor "bordering" as "order".
        assert_eq!(Intent::classify_keywords("a bestseller bordering on fame"), Intent::General);
    }

    #[test]
    fn test_parse_round_trip() {
        for intent in Intent::ALL {
            assert_eq!(intent.as_str().parse::<Intent>().unwrap(), intent);
        }
        assert_eq!("risk-assessment".parse::<Intent>().unwrap(), Intent::RiskAssessment);
        assert!("weather".parse::<Intent>().is_err());
    }
}
