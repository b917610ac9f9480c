/// Reference A* listing shown beside the grid. Each `# N.` marker matches the
/// `code_line` value the solver emits for that phase of the search.
pub const ASTAR_LISTING: &str = "\
class AStarSolver:
    def solve(self):
        # 1. Initialize Open Set
        self.open_set.put(self.start, 0)

        while not self.open_set.empty():
            # 2. Pop node with lowest f-score
            current = self.open_set.get()
            self.closed_set.add(current)

            # 3. Check Goal
            if current == self.end:
                return reconstruct_path(current)

            # 4. Get Neighbors
            neighbors = self.get_neighbors(current)

            # 5. Loop Neighbors
            for neighbor in neighbors:
                if neighbor in self.closed_set: continue
                tentative_g = self.g_score[current] + 1

                # 6. Update Path
                if tentative_g < self.g_score.get(neighbor, inf):
                    self.came_from[neighbor] = current
                    self.g_score[neighbor] = tentative_g
                    h = heuristic(neighbor, self.end)
                    f = tentative_g + h * weight

                    # 7. Add to Open Set
                    self.open_set.put(neighbor, f)

        # 8. No Path
        return None";

pub fn lines() -> impl Iterator<Item = &'static str> {
    ASTAR_LISTING.lines()
}

pub fn line_count() -> usize {
    lines().count()
}

/// 0-based listing row carrying the `# N.` marker for a step's `code_line`.
/// Unknown markers highlight nothing.
pub fn line_for_code(code_line: usize) -> Option<usize> {
    if code_line == 0 {
        return None;
    }
    let marker = format!("# {code_line}.");
    lines().position(|line| line.trim_start().starts_with(&marker))
}
