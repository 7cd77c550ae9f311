mod common;
mod http;
mod invariants;
mod replication;
mod scenarios;
