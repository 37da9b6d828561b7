mod test_relay_with_mock_output;
mod test_unknown_target_dropped;
