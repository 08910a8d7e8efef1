/// Column offsets of the `(2r + 1)²` square around the origin, in outward
/// spiral order starting at `(0, 0)`: right, up, left, down with the run
/// length growing every second turn. Pairs are `(dx, dz)`.
pub fn spiral_offsets(radius: i32) -> Vec<(i32, i32)> {
    const DX: [i32; 4] = [1, 0, -1, 0];
    const DZ: [i32; 4] = [0, 1, 0, -1];
    let side = radius.max(0) * 2 + 1;
    let total = (side * side) as usize;
    let mut out = Vec::with_capacity(total);
    let (mut x, mut z) = (0, 0);
    out.push((x, z));

    let mut direction = 0usize;
    let mut run = 1;
    let mut steps = 0;
    let mut turns = 0;
    while out.len() < total {
        x += DX[direction];
        z += DZ[direction];
        out.push((x, z));
        steps += 1;
        if steps == run {
            direction = (direction + 1) % 4;
            steps = 0;
            turns += 1;
            if turns % 2 == 0 {
                run += 1;
            }
        }
    }
    out
}
