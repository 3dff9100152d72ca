use std::io::BufRead;

/// Gate in front of every mutating batch. Zero queued changes short-circuits
/// to a no-op; otherwise `--assume-yes` opens the gate immediately, and an
/// interactive prompt requires an exact `y` or `yes`. Declining is not an
/// error.
pub fn confirm_gate<R: BufRead>(change_count: usize, assume_yes: bool, input: &mut R) -> bool {
    if change_count == 0 {
        eprintln!("nothing to do");
        return false;
    }
    if assume_yes || prompt_operator(input) {
        return true;
    }
    eprintln!("action(s) aborted");
    false
}

fn prompt_operator<R: BufRead>(input: &mut R) -> bool {
    eprint!("Do you confirm the above action(s)? [y|N] ");
    let mut line = String::new();
    if input.read_line(&mut line).is_err() {
        return false;
    }
    let answer = line.strip_suffix('\n').unwrap_or(line.as_str());
    answer == "y" || answer == "yes"
}
