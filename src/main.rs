fn main() {
    lidar_radar_pipeline::cli::run();
}
