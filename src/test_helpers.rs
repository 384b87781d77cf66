use crate::{
    bet::{
        Bet,
        BetId,
        BetResult,
        UNSPECIFIED_SOURCE,
    },
    client::dispatch,
    controller::{
        self,
        Effect,
        Msg,
        ViewState,
    },
    service::DataService,
    validation::FormFields,
};
use chrono::NaiveDate;
use std::collections::VecDeque;

/// Feeds `msg` through the controller and answers every service call in
/// order, until nothing is left to do. Returns the non-call effects.
pub async fn settle<S: DataService>(
    service: &S,
    state: ViewState,
    msg: Msg,
) -> (ViewState, Vec<Effect>) {
    let mut queue = VecDeque::from([msg]);
    let mut state = state;
    let mut rest = Vec::new();
    while let Some(msg) = queue.pop_front() {
        let (next, effects) = controller::update(state, msg);
        state = next;
        for effect in effects {
            match effect {
                Effect::Call(request) => {
                    if let Some(reply) = dispatch(service, request).await {
                        queue.push_back(Msg::Replied(reply));
                    }
                }
                other => rest.push(other),
            }
        }
    }
    (state, rest)
}

pub fn bet_on(id: i64, date: (i32, u32, u32), result: BetResult) -> Bet {
    let (year, month, day) = date;
    Bet {
        id: BetId(id),
        date: NaiveDate::from_ymd_opt(year, month, day).unwrap(),
        event: format!("Home {id} - Away {id}"),
        coefficient: 2.0,
        stake: 100.0,
        result,
        source: UNSPECIFIED_SOURCE.to_string(),
    }
}

/// `count` bets spread over the first days of `month` 2025.
pub fn bets_in_month(first_id: i64, count: usize, month: u32) -> Vec<Bet> {
    (0..count)
        .map(|i| {
            bet_on(
                first_id + i as i64,
                (2025, month, (i % 28) as u32 + 1),
                BetResult::ALL[i % BetResult::ALL.len()],
            )
        })
        .collect()
}

pub fn filled_form(date: &str, event: &str) -> FormFields {
    FormFields {
        date: date.to_string(),
        event: event.to_string(),
        coefficient: "1,95".to_string(),
        stake: "250".to_string(),
        result: Some(BetResult::Win),
        source: String::new(),
    }
}
