use crate::fee::context::FeeContext;
use crate::fee::rule::{Rule, Tally};
use crate::fee::{round_currency, FeeError, FeeResult};
use std::fmt;
use std::fmt::{Display, Formatter};
use tracing::debug;

const STANDARD: &[Rule] = &[Rule::BaseFee, Rule::UserDiscount, Rule::FeeCap];

const PROGRESSIVE: &[Rule] = &[
    Rule::BaseFee,
    Rule::ProgressiveEscalation,
    Rule::UserDiscount,
    Rule::FeeCap,
];

const WEEKEND_EXCLUSIVE: &[Rule] = &[
    Rule::WeekendExclusion,
    Rule::BaseFee,
    Rule::UserDiscount,
    Rule::FeeCap,
];

/// 연체료 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StrategyName {
    Standard,
    Progressive,
    WeekendExclusive,
}

impl StrategyName {
    pub const ALL: [StrategyName; 3] = [
        StrategyName::Standard,
        StrategyName::Progressive,
        StrategyName::WeekendExclusive,
    ];

    /// 유예 기간을 제외한 정책의 규칙 순서
    pub fn rules(&self) -> &'static [Rule] {
        match self {
            StrategyName::Standard => STANDARD,
            StrategyName::Progressive => PROGRESSIVE,
            StrategyName::WeekendExclusive => WEEKEND_EXCLUSIVE,
        }
    }

    /// 실제로 적용할 규칙 순서, 유예 기간이 적용되면 `base_fee` 바로 앞에 `grace_period`가 들어간다.
    pub fn pipeline(&self, grace: bool) -> Vec<Rule> {
        let rules = self.rules();
        if !grace {
            return rules.to_vec();
        }

        let mut pipeline = Vec::with_capacity(rules.len() + 1);
        for rule in rules {
            if *rule == Rule::BaseFee {
                pipeline.push(Rule::GracePeriod);
            }
            pipeline.push(*rule);
        }
        pipeline
    }

    /// 컨텍스트에 대해 파이프라인을 왼쪽부터 차례대로 적용한다. 상태를 갖지 않으므로 같은 입력에는 같은 결과를 반환한다.
    pub fn evaluate(&self, context: &FeeContext) -> FeeResult {
        let pipeline = self.pipeline(context.grace_window().is_some());

        let mut tally = Tally::new(context.days());
        let mut applied = Vec::with_capacity(pipeline.len());
        for rule in pipeline {
            tally = rule.apply(context, tally);
            applied.push(rule.name());
        }

        let amount = round_currency(tally.amount);
        debug!(
            strategy = %self,
            category = %context.category(),
            user_type = %context.user_type(),
            overdue_days = context.days().get(),
            billed_days = tally.days.get(),
            amount = %amount,
            "Fee evaluated"
        );

        FeeResult::new(*self, amount, context.days(), tally.days, applied)
    }
}

impl TryFrom<&str> for StrategyName {
    type Error = FeeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "standard" => Ok(StrategyName::Standard),
            "progressive" => Ok(StrategyName::Progressive),
            "weekend_exclusive" => Ok(StrategyName::WeekendExclusive),
            _ => Err(FeeError::UnknownStrategy(value.to_owned())),
        }
    }
}

impl Display for StrategyName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            StrategyName::Standard => write!(f, "standard"),
            StrategyName::Progressive => write!(f, "progressive"),
            StrategyName::WeekendExclusive => write!(f, "weekend_exclusive"),
        }
    }
}
