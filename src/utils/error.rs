use std::error::Error;
use std::iter;

/// The message of `err` followed by the messages of its sources
pub fn chain_messages(err: &(dyn Error + 'static)) -> Vec<String> {
    iter::successors(Some(err), |err| (*err).source())
        .map(|err| err.to_string())
        .collect()
}
