//! # 요청 세대(generation) 토큰
//!
//! 컨트롤러는 새 조회를 시작할 때마다 티켓을 발급받습니다.
//! 응답이 돌아왔을 때 그 티켓이 가장 최근 것이 아니면 응답을 버립니다.
//! 필터를 빠르게 바꾸는 동안 늦게 도착한 이전 응답이 최신 결과를 덮어쓰지 않게 합니다.

/// 조회 한 번에 대응하는 티켓
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
pub struct RequestGeneration {
    current: u64,
}

impl RequestGeneration {
    /// 새 티켓을 발급합니다. 이전에 발급된 티켓은 모두 무효가 됩니다.
    pub fn issue(&mut self) -> Ticket {
        self.current += 1;
        Ticket(self.current)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_ticket_invalidates_older() {
        let mut generation = RequestGeneration::default();
        let first = generation.issue();
        assert!(generation.is_current(first));

        let second = generation.issue();
        assert!(!generation.is_current(first));
        assert!(generation.is_current(second));
    }
}
