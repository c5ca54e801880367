fn main() {
    festive_scene_lib::run()
}
