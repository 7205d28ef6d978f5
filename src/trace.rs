//! JSON-lines input traces and their replay through a [`Dispatcher`].

use anyhow::{Result, anyhow};
use log::debug;
use serde::Deserialize;
use std::io::BufRead;

use crate::dispatcher::{Dispatcher, PointerInput, PointerPhase, RawTouchMove};
use crate::event::GestureEvent;
use crate::tracker::PointerSample;

/// One line of a trace, tagged by `phase`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
pub enum TraceRecord {
    Down(PointerSample),
    Move(PointerSample),
    Up(PointerSample),
    Leave(PointerSample),
    Cancel { t: u64 },
    /// Advance the clock without input.
    Tick { t: u64 },
    TouchMove(RawTouchMove),
}

/// Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<TraceRecord>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(line)?))
}

pub fn parse<R: BufRead>(reader: R) -> Result<Vec<TraceRecord>> {
    let mut out = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        let rec = parse_line(&line).map_err(|e| anyhow!("trace line {}: {e}", n + 1))?;
        out.extend(rec);
    }
    Ok(out)
}

/// Feeds every record through `dispatcher`, returning events in emission
/// order.
pub fn replay(records: &[TraceRecord], dispatcher: &mut Dispatcher) -> Vec<GestureEvent> {
    let mut events = Vec::new();
    for rec in records {
        let input = |phase, sample: &PointerSample| PointerInput {
            phase,
            sample: *sample,
        };
        match rec {
            TraceRecord::Down(s) => events.extend(dispatcher.handle(input(PointerPhase::Down, s))),
            TraceRecord::Move(s) => events.extend(dispatcher.handle(input(PointerPhase::Move, s))),
            TraceRecord::Up(s) => events.extend(dispatcher.handle(input(PointerPhase::Up, s))),
            TraceRecord::Leave(s) => {
                events.extend(dispatcher.handle(input(PointerPhase::Leave, s)))
            }
            TraceRecord::Cancel { t } => events.extend(
                dispatcher.handle(PointerInput::new(PointerPhase::Cancel, 0, 0.0, 0.0, *t)),
            ),
            TraceRecord::Tick { t } => events.extend(dispatcher.advance_to(*t)),
            TraceRecord::TouchMove(raw) => {
                let claimed = dispatcher.raw_touch_move(raw);
                debug!("trace: touchmove at {} claimed={claimed}", raw.timestamp_ms);
            }
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_record_kind() {
        let txt = r#"
# a comment
{"phase":"down","id":1,"x":0,"y":0,"t":0}
{"phase":"move","id":1,"x":5.5,"y":0,"t":10}
{"phase":"up","id":1,"x":5.5,"y":0,"t":20}
{"phase":"leave","id":2,"x":1,"y":1,"t":21}
{"phase":"cancel","t":30}
{"phase":"tick","t":40}
{"phase":"touchmove","t":50,"touches":[{"x":1,"y":2}]}
"#;
        let recs = parse(txt.as_bytes()).unwrap();
        assert_eq!(recs.len(), 7);
        assert_eq!(recs[1], TraceRecord::Move(PointerSample::new(1, 5.5, 0.0, 10)));
        assert_eq!(recs[4], TraceRecord::Cancel { t: 30 });
        assert_eq!(recs[5], TraceRecord::Tick { t: 40 });
        match &recs[6] {
            TraceRecord::TouchMove(raw) => assert_eq!(raw.touches.len(), 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bad_line_reports_its_number() {
        let txt = "{\"phase\":\"down\",\"id\":1,\"x\":0,\"y\":0,\"t\":0}\n{\"phase\":\"hover\"}\n";
        let err = parse(txt.as_bytes()).unwrap_err();
        assert!(err.to_string().starts_with("trace line 2:"));
    }
}
