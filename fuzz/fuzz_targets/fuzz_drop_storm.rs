#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use reflow_reorder::{ContainerKey, Layout, RecordId};

const GROUPS: [&str; 3] = ["todo", "doing", "done"];

#[derive(Arbitrary, Debug)]
struct Storm {
    /// record index → group index at setup
    assignment: Vec<u8>,
    /// (record, destination group, raw insertion index)
    moves: Vec<(u8, u8, u8)>,
}

fuzz_target!(|storm: Storm| {
    let count = storm.assignment.len().min(32);
    let mut layout = Layout::new();
    for group in GROUPS {
        layout.set_container(ContainerKey::group(group), Vec::<String>::new());
    }
    let mut members: [Vec<String>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    for (record, group) in storm.assignment.iter().take(count).enumerate() {
        members[(*group as usize) % GROUPS.len()].push(format!("r{record}"));
    }
    for (group, ids) in GROUPS.iter().zip(members) {
        layout.set_container(ContainerKey::group(*group), ids);
    }

    for (record, group, index) in storm.moves.iter().take(256) {
        if count == 0 {
            break;
        }
        let id = RecordId::new(format!("r{}", (*record as usize) % count));
        let destination = ContainerKey::group(GROUPS[(*group as usize) % GROUPS.len()]);
        let plan = layout.apply_move(&id, destination, *index as usize);
        assert!(plan.is_some());

        // Membership is conserved and ranks stay dense after every move.
        let mut total = 0;
        for key in GROUPS.iter().map(|group| ContainerKey::group(*group)) {
            let ranks = layout.ranks(&key);
            for (position, (_, rank)) in ranks.iter().enumerate() {
                assert_eq!(*rank as usize, position + 1);
            }
            total += ranks.len();
        }
        assert_eq!(total, count);
    }
});
