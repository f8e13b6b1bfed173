/// Counters kept by a NetIO.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkStats {
    pub datagrams_sent: u64,
    pub datagrams_received: u64,
    pub pdus_sent: u64,
    pub pdus_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub send_failures: u64,
    pub decode_errors: u64,
    /// Our own entities heard back.
    pub echoes_dropped: u64,
    pub foreign_exercise_dropped: u64,
    /// Valid PDUs of a type this node does not act on.
    pub unhandled: u64,
    pub entities_timed_out: u64,
}

impl NetworkStats {
    pub fn record_sent(&mut self, bytes: usize, pdus: usize) {
        self.datagrams_sent += 1;
        self.pdus_sent += pdus as u64;
        self.bytes_sent += bytes as u64;
    }

    pub fn record_received(&mut self, bytes: usize) {
        self.datagrams_received += 1;
        self.bytes_received += bytes as u64;
    }
}
